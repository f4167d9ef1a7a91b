//! # Ceremony Scheduler
//!
//! Per-circuit participation queue and baton hand-off:
//! admission, promotion, hand-off, and timeout enforcement. `queue` and
//! `timeout` are the pure mechanics; `scheduler` wires them to
//! `MetaStore`/`BlobStore`/`shared-bus`.

pub mod errors;
pub mod queue;
pub mod scheduler;
pub mod timeout;

pub use errors::SchedulerError;
pub use scheduler::Scheduler;
