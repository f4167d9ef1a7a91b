//! # Integration Tests
//!
//! End-to-end ceremony scenarios driven through `Dispatcher`, the same
//! in-process call sequence `ceremony-api-gateway`'s HTTP handlers use,
//! against a `CoordinatorContainer` wired with in-memory adapters.

pub mod support;

#[cfg(test)]
mod s1_single_contributor_single_circuit;
#[cfg(test)]
mod s2_two_contributors_fifo;
#[cfg(test)]
mod s3_timeout_and_resume;
#[cfg(test)]
mod s4_invalid_contribution;
#[cfg(test)]
mod s5_resumable_upload;
#[cfg(test)]
mod s6_finalization;
