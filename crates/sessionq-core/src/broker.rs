//! Collaborator traits for the session-oriented broker.

use async_trait::async_trait;

use crate::error::{AcceptError, CloseError};

/// A broker-assigned, session-affine unit of queued work.
///
/// A session is exclusively owned by the worker processing it, and must be
/// closed exactly once regardless of how that processing went. Brokers do
/// not guarantee an idempotent close.
#[async_trait]
pub trait QueueSession: Send + 'static {
    /// The broker-assigned session id, for logging and tracing.
    fn session_id(&self) -> &str;

    /// Close the session, returning its lock to the broker.
    async fn close(&mut self) -> Result<(), CloseError>;
}

/// Client for accepting sessions from the broker.
#[async_trait]
pub trait SessionClient: Send + Sync + 'static {
    /// The session handle type this client yields.
    type Session: QueueSession;

    /// Wait until the broker offers the next available session.
    ///
    /// Blocks indefinitely while no session is pending and takes no
    /// cancellation parameter; callers that need to abandon the wait must
    /// race it externally. Under normal operation this fails periodically
    /// with [`AcceptError::Timeout`] even when sessions exist.
    async fn accept_next_session(&self) -> Result<Self::Session, AcceptError>;
}
