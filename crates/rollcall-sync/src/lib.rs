//! Rollcall Sync - Offline-resilient action queue and reconciliation engine
//!
//! Provides:
//! - A durable FIFO queue of pending actions
//! - A dead-letter list for actions the server refused
//! - The last-good snapshot cache for fully offline boot
//! - The sync engine draining the queue against the server
//! - Network/health monitoring and the trigger loop tying it together
//!
//! ## Modules
//!
//! - [`queue`] - Durable queue store with reference remapping
//! - [`dead_letter`] - Operator-visible quarantine of rejected actions
//! - [`snapshot`] - Persisted authoritative snapshot with staleness checks
//! - [`engine`] - Drain cycles, direct submission and status
//! - [`monitor`] - Link signal plus periodic backend probe
//! - [`scheduler`] - Event loop turning signals into drains and refreshes

pub mod dead_letter;
pub mod engine;
pub mod identity;
pub mod monitor;
pub mod queue;
pub mod scheduler;
pub mod snapshot;

mod persist;

pub use dead_letter::DeadLetterStore;
pub use engine::{
    DrainReport, EngineSettings, EngineStatus, ScanOutcome, SubmitOutcome, SyncEngine, SyncPhase,
};
pub use monitor::{NetworkMonitor, NetworkState, NetworkStatus};
pub use queue::QueueStore;
pub use scheduler::SyncScheduler;
pub use snapshot::SnapshotCache;

use rollcall_core::domain::{DomainError, TempId};
use rollcall_core::outcome::ErrorKind;
use rollcall_core::ports::RemoteError;
use thiserror::Error;

/// Errors that can occur during queue and engine operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local store refused a write; the in-memory state was rolled back
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// A stored document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A call to the attendance server failed
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A domain-level error propagated from rollcall-core
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// No dead letter with the given id
    #[error("Dead letter not found: {0}")]
    DeadLetterNotFound(TempId),
}

impl SyncError {
    pub(crate) fn persistence(err: anyhow::Error) -> Self {
        SyncError::Persistence(format!("{err:#}"))
    }

    /// Returns the taxonomy kind, where one applies
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            SyncError::Persistence(_) => Some(ErrorKind::PersistenceFailure),
            SyncError::Remote(_) => Some(ErrorKind::TransientNetwork),
            SyncError::Serialization(_)
            | SyncError::Domain(_)
            | SyncError::DeadLetterNotFound(_) => None,
        }
    }
}
