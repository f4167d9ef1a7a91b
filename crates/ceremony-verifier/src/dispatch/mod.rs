mod backend;
mod in_process;
mod vm;

pub use backend::{VerificationBackend, VerifyRequest, VerifyResult};
pub use in_process::InProcessBackend;
pub use vm::VmBackend;
