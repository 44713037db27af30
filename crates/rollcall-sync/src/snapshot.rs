//! Snapshot cache
//!
//! Holds the last authoritative state the server returned and persists it so
//! the kiosk can boot and render while fully offline. Refreshes replace it
//! wholesale; nothing else writes to it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use rollcall_core::domain::Snapshot;
use rollcall_core::ports::{IKeyValueStore, SnapshotData};

use crate::persist::{load_json, save_json, SNAPSHOT_KEY};
use crate::SyncError;

/// The persisted last-good snapshot
pub struct SnapshotCache {
    store: Arc<dyn IKeyValueStore>,
    current: Snapshot,
}

impl SnapshotCache {
    /// Loads the persisted snapshot; an empty one when none was saved
    pub async fn load(store: Arc<dyn IKeyValueStore>) -> Result<Self, SyncError> {
        let current: Snapshot = load_json(store.as_ref(), SNAPSHOT_KEY)
            .await?
            .unwrap_or_default();
        debug!(revision = current.revision, records = current.records.len(), "Loaded snapshot");
        Ok(Self { store, current })
    }

    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// Replaces the snapshot with freshly fetched data
    ///
    /// Returns `Ok(false)` without touching anything when the server version
    /// is older than the one already held. The local revision increases by
    /// one on every accepted replacement.
    pub async fn replace(
        &mut self,
        data: SnapshotData,
        fetched_at: DateTime<Utc>,
    ) -> Result<bool, SyncError> {
        if self.current.is_newer_than(data.version) {
            info!(
                held = ?self.current.server_version,
                received = ?data.version,
                "Discarding stale snapshot"
            );
            return Ok(false);
        }

        let next = Snapshot {
            revision: self.current.revision + 1,
            server_version: data.version,
            fetched_at: Some(fetched_at),
            roster: data
                .roster
                .into_iter()
                .map(|entry| (entry.subject.clone(), entry))
                .collect(),
            records: data.records,
        };
        save_json(self.store.as_ref(), SNAPSHOT_KEY, &next).await?;

        debug!(revision = next.revision, records = next.records.len(), "Snapshot replaced");
        self.current = next;
        Ok(true)
    }
}
