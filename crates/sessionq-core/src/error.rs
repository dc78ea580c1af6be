//! Error taxonomy for session acquisition, execution, and close.
//!
//! Each concern gets its own small error type; classification between
//! transient and fatal accept faults happens here, at the broker boundary,
//! so the listener machinery stays policy-free.

use thiserror::Error;

/// Failure from the broker's accept-next-session call.
#[derive(Debug, Error)]
pub enum AcceptError {
    /// The accept call timed out with no session available.
    ///
    /// Routine under normal operation (broker-side polling artifact);
    /// retried indefinitely by the acquirer and never surfaced.
    #[error("accept timed out with no session available")]
    Timeout,

    /// The broker connection failed.
    #[error("broker connection failure: {0}")]
    Connection(String),

    /// The broker rejected the caller's credentials or access rights.
    #[error("broker authorization failure: {0}")]
    Unauthorized(String),
}

impl AcceptError {
    /// Whether this fault is a routine polling timeout that should be
    /// retried rather than escalated.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Failure while closing a claimed session.
///
/// Always caught and logged by the processor; never escalated and never
/// allowed to block slot release.
#[derive(Debug, Error)]
#[error("session close failed: {0}")]
pub struct CloseError(pub String);

/// Failure raised by the host executor while handling a session.
///
/// Isolated to the one session it occurred on.
#[derive(Debug, Error)]
#[error("session handler failed: {0}")]
pub struct ExecutionError(pub String);

/// Fatal listener failure surfaced to the embedding host.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The broker accept call failed with a non-transient fault.
    #[error("session accept failed: {0}")]
    Accept(#[from] AcceptError),
}
