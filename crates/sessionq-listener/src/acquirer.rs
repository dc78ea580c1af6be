//! Session acquisition — racing a non-cancellable accept against shutdown.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing;

use sessionq_core::broker::{QueueSession, SessionClient};
use sessionq_core::error::AcceptError;

/// Obtains the next session from the broker.
///
/// The broker's accept primitive blocks indefinitely and offers no external
/// cancellation, so each accept runs on its own task and shutdown is
/// emulated by abandoning that task rather than stopping it.
#[derive(Debug)]
pub struct SessionAcquirer<C> {
    client: Arc<C>,
}

impl<C: SessionClient> SessionAcquirer<C> {
    /// Create an acquirer over the given broker client.
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Wait for the next session, or `None` if `shutdown` fires first.
    ///
    /// Transient accept timeouts are routine broker polling behavior and
    /// are retried indefinitely. Any other accept fault is fatal and
    /// surfaces to the caller.
    pub async fn next(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<Option<C::Session>, AcceptError> {
        loop {
            let client = Arc::clone(&self.client);
            let mut accept: JoinHandle<Result<C::Session, AcceptError>> =
                tokio::spawn(async move { client.accept_next_session().await });

            tokio::select! {
                joined = &mut accept => match joined {
                    Ok(Ok(session)) => {
                        tracing::debug!("Accepted session '{}'", session.session_id());
                        return Ok(Some(session));
                    }
                    Ok(Err(fault)) if fault.is_transient() => {
                        tracing::trace!("Accept timed out with no session pending, retrying");
                    }
                    Ok(Err(fault)) => {
                        return Err(fault);
                    }
                    Err(join_error) => {
                        return Err(AcceptError::Connection(format!(
                            "accept task failed: {}",
                            join_error
                        )));
                    }
                },
                _ = shutdown.cancelled() => {
                    // The in-flight accept cannot be stopped, only outlived.
                    // Hand it to a reaper so a session it still lands does
                    // not stay locked at the broker.
                    tokio::spawn(reap_abandoned_accept(accept));
                    return Ok(None);
                }
            }
        }
    }
}

/// Close any session yielded by an accept call that lost the shutdown race.
async fn reap_abandoned_accept<S: QueueSession>(accept: JoinHandle<Result<S, AcceptError>>) {
    if let Ok(Ok(mut session)) = accept.await {
        let session_id = session.session_id().to_string();
        tracing::warn!("Closing session '{}' accepted after shutdown", session_id);
        if let Err(e) = session.close().await {
            tracing::error!("Failed to close abandoned session '{}': {}", session_id, e);
        }
    }
}
