//! Per-session worker body — invoke host logic, close, release.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing;

use sessionq_core::broker::QueueSession;
use sessionq_core::executor::{SessionExecutor, SessionInput};

use crate::gate::AdmissionSlot;

/// How one processed session went. Logging only — slot accounting never
/// depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Host logic ran and reported success.
    pub handled: bool,
    /// The session close call succeeded.
    pub closed: bool,
}

/// Executes host logic against one claimed session.
///
/// Faults from the executor and from the close call are contained here; a
/// misbehaving session never disturbs the dispatch loop or other workers.
#[derive(Debug)]
pub struct SessionProcessor<E> {
    executor: Arc<E>,
}

impl<E> SessionProcessor<E> {
    /// Create a processor over the host executor.
    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// Process one session, then close it and release the admission slot.
    ///
    /// The invocation and the close are both attempted in every outcome
    /// combination; the slot is released last, exactly once, via the drop
    /// of `slot`.
    pub async fn run<S>(
        &self,
        mut session: S,
        slot: AdmissionSlot,
        shutdown: CancellationToken,
    ) -> ExecutionOutcome
    where
        S: QueueSession,
        E: SessionExecutor<S>,
    {
        let session_id = session.session_id().to_string();

        // catch_unwind contains a panicking executor the same way an Err is
        let invocation = AssertUnwindSafe(
            self.executor
                .try_execute(SessionInput::new(&mut session), &shutdown),
        )
        .catch_unwind()
        .await;

        let handled = match invocation {
            Ok(Ok(true)) => {
                tracing::debug!("Session '{}' handled successfully", session_id);
                true
            }
            Ok(Ok(false)) => {
                tracing::warn!("Handler reported failure for session '{}'", session_id);
                false
            }
            Ok(Err(fault)) => {
                tracing::error!("Handler failed for session '{}': {}", session_id, fault);
                false
            }
            Err(_) => {
                tracing::error!("Handler panicked for session '{}'", session_id);
                false
            }
        };

        let closed = match session.close().await {
            Ok(()) => {
                tracing::debug!("Closed session '{}'", session_id);
                true
            }
            Err(e) => {
                tracing::error!("Failed to close session '{}': {}", session_id, e);
                false
            }
        };

        // Close has been attempted whatever the invocation outcome; only now
        // does the slot go back to the gate.
        drop(slot);

        ExecutionOutcome { handled, closed }
    }
}
