//! Admission-controlled consumer loop for session-oriented queue traffic.
//!
//! This crate provides:
//! - An admission gate bounding the number of concurrently processed sessions
//! - A session acquirer that races the broker's blocking accept against shutdown
//! - A per-session processor that guarantees close and slot release
//! - The listener loop composing the three, with graceful drain on shutdown

pub mod acquirer;
pub mod gate;
pub mod listener;
pub mod processor;

pub use acquirer::SessionAcquirer;
pub use gate::{AdmissionGate, AdmissionSlot};
pub use listener::SessionListener;
pub use processor::{ExecutionOutcome, SessionProcessor};
