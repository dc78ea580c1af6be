//! Admission control — a counting gate bounding concurrent sessions.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing;

/// One unit of admission capacity.
///
/// The slot returns to the gate when dropped, which makes
/// release-exactly-once structural: whatever path a worker takes out of its
/// task, including a panic, the permit comes back.
#[derive(Debug)]
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}

/// Counting gate bounding the number of sessions processed concurrently.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionGate {
    /// Create a gate with `capacity` concurrent slots.
    ///
    /// Capacity is a positive count; zero is treated as one, since a gate
    /// that can never admit anything would hang every acquire until
    /// shutdown.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot.
    ///
    /// Returns `None` when `shutdown` fires before a slot frees up; never
    /// fails for any other reason.
    pub async fn acquire(&self, shutdown: &CancellationToken) -> Option<AdmissionSlot> {
        tokio::select! {
            permit = Arc::clone(&self.permits).acquire_owned() => {
                // The semaphore is never closed, so this cannot fail.
                permit.ok().map(|p| AdmissionSlot { _permit: p })
            }
            _ = shutdown.cancelled() => {
                tracing::debug!("Admission wait abandoned due to shutdown");
                None
            }
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
