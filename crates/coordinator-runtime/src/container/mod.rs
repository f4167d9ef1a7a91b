//! # Coordinator Container
//!
//! Central container holding every wired ceremony-* service with proper
//! lifetime management and dependency injection.
//!
//! - Stores/engines/providers are constructed first (Level 0)
//! - Services (`Scheduler`, `UploadCoordinator`, `Verifier`, `Finalizer`,
//!   `Setup`) are constructed from those, wired to the shared event bus
//!   (Level 1)
//! - `AppState` is assembled last, for the gateway to serve

pub mod build;
pub mod config;

pub use build::CoordinatorContainer;
pub use config::RuntimeConfig;
