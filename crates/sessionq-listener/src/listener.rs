//! The dispatch loop tying admission, acquisition, and processing together.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing;

use sessionq_core::broker::{QueueSession, SessionClient};
use sessionq_core::config::ListenerConfig;
use sessionq_core::error::ListenerError;
use sessionq_core::executor::SessionExecutor;

use crate::acquirer::SessionAcquirer;
use crate::gate::AdmissionGate;
use crate::processor::SessionProcessor;

/// Admission-controlled consumer loop for session-oriented queue traffic.
///
/// Repeatedly claims an available session from the broker and hands it to a
/// bounded pool of concurrent workers. Sessions are always closed and
/// admission slots always reclaimed, whatever the host logic does; shutdown
/// stops acceptance and drains in-flight workers under a configurable bound.
pub struct SessionListener<C, E> {
    gate: AdmissionGate,
    acquirer: SessionAcquirer<C>,
    processor: Arc<SessionProcessor<E>>,
    config: ListenerConfig,
}

impl<C, E> SessionListener<C, E>
where
    C: SessionClient,
    E: SessionExecutor<C::Session>,
{
    /// Create a listener over a broker client and a host executor.
    pub fn new(client: Arc<C>, executor: Arc<E>, config: ListenerConfig) -> Self {
        Self {
            gate: AdmissionGate::new(config.max_concurrent_sessions),
            acquirer: SessionAcquirer::new(client),
            processor: Arc::new(SessionProcessor::new(executor)),
            config,
        }
    }

    /// Run until `shutdown` fires or the broker fails fatally.
    ///
    /// Each accepted session is dispatched to its own worker task; the loop
    /// does not wait for workers between iterations. On exit, dispatched
    /// workers are drained for up to the configured timeout before control
    /// returns to the caller.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), ListenerError> {
        if shutdown.is_cancelled() {
            return Ok(());
        }

        tracing::info!(
            "Session listener started: queue='{}', connection='{}', max_concurrent_sessions={}",
            self.config.queue,
            self.config.connection,
            self.config.max_concurrent_sessions
        );

        let mut workers = JoinSet::new();
        let result = self.dispatch_loop(&mut workers, &shutdown).await;
        self.drain(workers).await;
        result
    }

    async fn dispatch_loop(
        &self,
        workers: &mut JoinSet<()>,
        shutdown: &CancellationToken,
    ) -> Result<(), ListenerError> {
        while !shutdown.is_cancelled() {
            let Some(slot) = self.gate.acquire(shutdown).await else {
                // Shutdown fired while waiting; no slot held
                break;
            };

            match self.acquirer.next(shutdown).await {
                Ok(Some(session)) => {
                    reap_finished(workers);
                    tracing::info!("Dispatching session '{}'", session.session_id());
                    let processor = Arc::clone(&self.processor);
                    let worker_shutdown = shutdown.clone();
                    workers.spawn(async move {
                        processor.run(session, slot, worker_shutdown).await;
                    });
                }
                Ok(None) => {
                    // Shutdown fired while waiting for a session; the slot
                    // acquired for this cycle goes back unused
                    drop(slot);
                    break;
                }
                Err(fault) => {
                    drop(slot);
                    tracing::error!("Fatal broker accept failure: {}", fault);
                    return Err(ListenerError::Accept(fault));
                }
            }
        }

        Ok(())
    }

    /// Wait for in-flight workers, bounded by the configured drain timeout.
    async fn drain(&self, mut workers: JoinSet<()>) {
        if workers.is_empty() {
            tracing::info!("Session listener stopped with no sessions in flight");
            return;
        }

        tracing::info!(
            "Session listener stopping, waiting for {} in-flight session(s)...",
            workers.len()
        );

        let deadline = Duration::from_secs(self.config.drain_timeout_seconds);
        let drained = tokio::time::timeout(deadline, async {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Session worker task failed: {}", e);
                }
            }
        })
        .await;

        match drained {
            Ok(()) => tracing::info!("Session listener shut down cleanly"),
            Err(_) => {
                tracing::warn!(
                    "Drain timed out with {} session worker(s) still running",
                    workers.len()
                );
                // Leave stragglers to finish (and close their sessions) on
                // their own; aborting them here would leak session locks
                workers.detach_all();
            }
        }
    }
}

/// Collect workers that already finished, surfacing task failures in the log.
fn reap_finished(workers: &mut JoinSet<()>) {
    while let Some(joined) = workers.try_join_next() {
        if let Err(e) = joined {
            tracing::error!("Session worker task failed: {}", e);
        }
    }
}
