//! # Shared Types Crate
//!
//! Core domain entities for the Phase 2 trusted setup coordinator: `Ceremony`,
//! `Circuit`, `WaitingQueue`, `Participant`, `Contribution`, and `Timeout`.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every crate in the workspace depends on this
//!   one for the shapes that cross a component boundary.
//! - **Storage agnostic**: these are plain structs, not tied to any document
//!   store. `ceremony-ports::MetaStore` is the seam that persists them.

pub mod ceremony;
pub mod circuit;
pub mod contribution;
pub mod ids;
pub mod participant;
pub mod timeout;
pub mod zkey_index;

pub use ceremony::*;
pub use circuit::*;
pub use contribution::*;
pub use ids::*;
pub use participant::*;
pub use timeout::*;
pub use zkey_index::*;
