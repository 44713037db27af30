//! Dead-letter store
//!
//! Actions the server refused with a non-retryable client error are moved
//! here instead of being dropped. Entries stay until an operator
//! acknowledges them.

use std::sync::Arc;

use tracing::{info, warn};

use rollcall_core::domain::{DeadLetter, TempId};
use rollcall_core::ports::IKeyValueStore;

use crate::persist::{load_json, save_json, DEAD_LETTERS_KEY};
use crate::SyncError;

/// Persisted list of quarantined actions
pub struct DeadLetterStore {
    store: Arc<dyn IKeyValueStore>,
    entries: Vec<DeadLetter>,
}

impl DeadLetterStore {
    pub async fn load(store: Arc<dyn IKeyValueStore>) -> Result<Self, SyncError> {
        let entries: Vec<DeadLetter> = load_json(store.as_ref(), DEAD_LETTERS_KEY)
            .await?
            .unwrap_or_default();
        Ok(Self { store, entries })
    }

    async fn persist(&self) -> Result<(), SyncError> {
        save_json(self.store.as_ref(), DEAD_LETTERS_KEY, &self.entries).await
    }

    /// Quarantines an action
    ///
    /// Pushing an id that is already present replaces the earlier entry, so
    /// a retried quarantine never shows the same action twice.
    pub async fn push(&mut self, letter: DeadLetter) -> Result<(), SyncError> {
        let before = self.entries.clone();
        let id = letter.id();
        let status = letter.status;
        match self.entries.iter_mut().find(|e| e.id() == id) {
            Some(existing) => *existing = letter,
            None => self.entries.push(letter),
        }

        if let Err(e) = self.persist().await {
            self.entries = before;
            return Err(e);
        }
        warn!(action_id = %id, status, total = self.entries.len(), "Action moved to dead letters");
        Ok(())
    }

    /// Removes an entry after the operator has seen it
    pub async fn acknowledge(&mut self, id: TempId) -> Result<DeadLetter, SyncError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or(SyncError::DeadLetterNotFound(id))?;
        let letter = self.entries.remove(index);

        if let Err(e) = self.persist().await {
            self.entries.insert(index, letter);
            return Err(e);
        }
        info!(action_id = %id, "Dead letter acknowledged");
        Ok(letter)
    }

    pub fn list(&self) -> &[DeadLetter] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
