//! # Coordinator Runtime Library
//!
//! Wires the ceremony-* service crates into a running process: builds the
//! `AppState` the gateway serves, runs the periodic timeout scan, and
//! exposes the binary's internals for testing.

pub mod auth;
pub mod container;
pub mod dispatcher;
pub mod timeouts;

pub use dispatcher::Dispatcher;
