//! The host-executor seam: typed invocation payload plus executor trait.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::broker::QueueSession;
use crate::error::ExecutionError;

/// Invocation payload handed to the host executor for one claimed session.
///
/// Carries the session handle by exclusive borrow: the executor may consume
/// messages through it, but ownership stays with the processor, which closes
/// the session after the invocation returns.
pub struct SessionInput<'a, S> {
    session: &'a mut S,
}

impl<'a, S: QueueSession> SessionInput<'a, S> {
    /// Wrap a session handle for invocation.
    pub fn new(session: &'a mut S) -> Self {
        Self { session }
    }

    /// The id of the session being processed.
    pub fn session_id(&self) -> &str {
        self.session.session_id()
    }

    /// The session handle itself.
    pub fn session(&mut self) -> &mut S {
        self.session
    }
}

/// Host-supplied logic invoked once per claimed session.
#[async_trait]
pub trait SessionExecutor<S: QueueSession>: Send + Sync + 'static {
    /// Run host logic against one session.
    ///
    /// Returns `Ok(true)` on success and `Ok(false)` when the invocation ran
    /// but reported failure; an `Err` is a fault in the host logic itself.
    /// All three outcomes are logged by the processor and none of them
    /// affect session close or slot accounting.
    async fn try_execute(
        &self,
        input: SessionInput<'_, S>,
        shutdown: &CancellationToken,
    ) -> Result<bool, ExecutionError>;
}
