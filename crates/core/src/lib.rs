//! Pure domain logic for the pecha annotation tracker.
//!
//! This crate has no internal dependencies and no I/O. It defines the status
//! vocabulary, membership roles, the review workflow state machine, the lock
//! policy, and the completion aggregation used by both the HTTP service
//! (`pecha-api`) and the typed client (`pecha-client`).

pub mod dashboard;
pub mod error;
pub mod locking;
pub mod roles;
pub mod stats;
pub mod status;
pub mod types;
pub mod view;
pub mod workflow;
