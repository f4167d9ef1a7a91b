//! # Ceremony Setup
//!
//! Ceremony and circuit provisioning: `setupCeremony`
//! allocates the ceremony, creates its bucket, creates every circuit
//! document with an empty waiting queue, provisions a verification VM per
//! `VM`-mechanism circuit, and uploads each circuit's genesis artifacts.

pub mod errors;
pub mod input;
pub mod paths;
pub mod setup;

pub use errors::SetupError;
pub use input::{CeremonySetupInput, CircuitSetupInput};
pub use setup::{Setup, SetupConfig};
