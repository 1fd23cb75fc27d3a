//! Concurrency gate bounding in-flight task executions

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{PanelError, PanelResult};

/// Admission control shared by every unit of a batch
///
/// Cloning yields another handle onto the same slots.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held gate slot; dropping it releases the slot
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    /// Create a gate with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot
    ///
    /// Returns [`PanelError::GateClosed`] once [`close`](Self::close) has
    /// been called, including for callers already waiting.
    pub async fn acquire(&self) -> PanelResult<GatePermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PanelError::GateClosed)?;
        Ok(GatePermit { _permit: permit })
    }

    /// Configured number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Slots currently held
    pub fn in_flight(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }

    /// Refuse all further admissions
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Whether the gate has been closed
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}
