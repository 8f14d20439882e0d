//! Admission gate (spec §5): bounds concurrently executing query handlers.
//!
//! A plain `tokio::sync::Semaphore` wrapper. `try_acquire` rather than
//! `acquire` is deliberate: a full gate must reject immediately with
//! `Overloaded` rather than queue, per spec.md §5 ("new requests get a
//! server overloaded response rather than queueing indefinitely").

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use beingdb_core::{BeingDbError, BeingDbResult};

/// Process-wide limiter on concurrent query handlers.
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
}

impl AdmissionGate {
    /// Build a gate with `max_concurrent` permits.
    pub fn new(max_concurrent: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(max_concurrent)) }
    }

    /// Acquire one permit, or fail immediately with [`BeingDbError::Overloaded`].
    pub fn try_acquire(&self) -> BeingDbResult<OwnedSemaphorePermit> {
        self.semaphore.clone().try_acquire_owned().map_err(|_| BeingDbError::Overloaded)
    }
}
