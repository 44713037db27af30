//! Durable queue store
//!
//! The [`QueueStore`] is the ordered list of actions the server has not
//! acknowledged yet. It is the source of truth for everything the kiosk
//! shows beyond the last snapshot, so it must survive restarts.
//!
//! ## Durability
//!
//! Every mutation writes the whole queue back to the key/value store before
//! returning. If the write fails the in-memory change is undone and
//! [`SyncError::Persistence`] is returned, so memory never runs ahead of disk.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use rollcall_core::domain::{PendingAction, RecordId, TempId};
use rollcall_core::ports::IKeyValueStore;

use crate::persist::{load_json, save_json, QUEUE_KEY};
use crate::SyncError;

/// FIFO of pending actions, persisted on every mutation
pub struct QueueStore {
    store: Arc<dyn IKeyValueStore>,
    items: VecDeque<PendingAction>,
}

impl QueueStore {
    /// Loads the persisted queue, or starts empty
    pub async fn load(store: Arc<dyn IKeyValueStore>) -> Result<Self, SyncError> {
        let items: VecDeque<PendingAction> = load_json(store.as_ref(), QUEUE_KEY)
            .await?
            .unwrap_or_default();
        if !items.is_empty() {
            info!(pending = items.len(), "Restored pending actions");
        }
        Ok(Self { store, items })
    }

    async fn persist(&self) -> Result<(), SyncError> {
        save_json(self.store.as_ref(), QUEUE_KEY, &self.items).await
    }

    /// Appends an action at the back and returns its id
    pub async fn append(&mut self, action: PendingAction) -> Result<TempId, SyncError> {
        let id = action.id;
        self.items.push_back(action);
        if let Err(e) = self.persist().await {
            self.items.pop_back();
            warn!(action_id = %id, error = %e, "Failed to persist queued action");
            return Err(e);
        }
        debug!(action_id = %id, pending = self.items.len(), "Action queued");
        Ok(id)
    }

    /// Returns the oldest pending action
    pub fn peek_front(&self) -> Option<&PendingAction> {
        self.items.front()
    }

    /// Removes the oldest pending action
    pub async fn remove_front(&mut self) -> Result<Option<PendingAction>, SyncError> {
        let Some(front) = self.items.pop_front() else {
            return Ok(None);
        };
        if let Err(e) = self.persist().await {
            warn!(action_id = %front.id, error = %e, "Failed to persist queue removal");
            self.items.push_front(front);
            return Err(e);
        }
        debug!(action_id = %front.id, pending = self.items.len(), "Action dequeued");
        Ok(Some(front))
    }

    /// Rewrites every queued reference to `old` so it points at `new`
    ///
    /// Returns the number of actions that changed. Nothing is written when
    /// no action references `old`.
    pub async fn remap_references(
        &mut self,
        old: TempId,
        new: RecordId,
    ) -> Result<usize, SyncError> {
        if !self.items.iter().any(|p| p.action.references(old)) {
            return Ok(0);
        }

        let before = self.items.clone();
        let changed = self
            .items
            .iter_mut()
            .map(|p| p.action.remap(old, new))
            .filter(|changed| *changed)
            .count();

        if let Err(e) = self.persist().await {
            self.items = before;
            return Err(e);
        }
        info!(temp_id = %old, record_id = %new, changed, "Remapped queued references");
        Ok(changed)
    }

    /// Notes a failed delivery attempt on the front action
    pub async fn record_front_failure(&mut self, error: &str) -> Result<(), SyncError> {
        let Some(front) = self.items.front_mut() else {
            return Ok(());
        };
        let previous = (front.retry_count, front.last_error.clone());
        front.record_failure(error);

        if let Err(e) = self.persist().await {
            if let Some(front) = self.items.front_mut() {
                (front.retry_count, front.last_error) = previous;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Returns the pending actions in queue order
    pub fn list(&self) -> Vec<PendingAction> {
        self.items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rollcall_core::domain::{Action, RecordRef, Seat, SubjectRef};
    use rollcall_core::ports::MemoryKeyValueStore;

    use super::*;

    fn check_in(subject: &str) -> PendingAction {
        PendingAction::new(
            Action::CheckIn {
                subject: SubjectRef::new(subject).unwrap(),
                seat: Seat::new("12").unwrap(),
                entry_time: Utc.with_ymd_and_hms(2026, 4, 1, 8, 30, 0).unwrap(),
            },
            Utc::now(),
        )
    }

    fn check_out(subject: &str, target: TempId) -> PendingAction {
        PendingAction::new(
            Action::CheckOut {
                subject: SubjectRef::new(subject).unwrap(),
                target: Some(RecordRef::Temp(target)),
                exit_time: Utc.with_ymd_and_hms(2026, 4, 1, 9, 30, 0).unwrap(),
            },
            Utc::now(),
        )
    }

    async fn empty_queue() -> (Arc<MemoryKeyValueStore>, QueueStore) {
        let store = Arc::new(MemoryKeyValueStore::new());
        let queue = QueueStore::load(store.clone()).await.unwrap();
        (store, queue)
    }

    #[tokio::test]
    async fn test_fifo_order_and_reload() {
        let (store, mut queue) = empty_queue().await;
        let a = queue.append(check_in("A")).await.unwrap();
        let b = queue.append(check_in("B")).await.unwrap();

        let reloaded = QueueStore::load(store.clone()).await.unwrap();
        let ids: Vec<_> = reloaded.list().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a, b]);

        assert_eq!(queue.remove_front().await.unwrap().unwrap().id, a);
        assert_eq!(queue.peek_front().unwrap().id, b);
        let reloaded = QueueStore::load(store).await.unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_front_on_empty_queue() {
        let (_store, mut queue) = empty_queue().await;
        assert!(queue.remove_front().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_append_is_rolled_back() {
        let (store, mut queue) = empty_queue().await;
        store.set_fail_writes(true);

        let result = queue.append(check_in("A")).await;
        assert!(matches!(result, Err(SyncError::Persistence(_))));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_front() {
        let (store, mut queue) = empty_queue().await;
        let a = queue.append(check_in("A")).await.unwrap();
        store.set_fail_writes(true);

        assert!(queue.remove_front().await.is_err());
        assert_eq!(queue.peek_front().unwrap().id, a);
    }

    #[tokio::test]
    async fn test_remap_rewrites_later_checkout() {
        let (store, mut queue) = empty_queue().await;
        let check_in = check_in("S42");
        let temp = check_in.id;
        queue.append(check_in).await.unwrap();
        queue.append(check_out("S42", temp)).await.unwrap();

        let changed = queue.remap_references(temp, RecordId::new(789)).await.unwrap();
        assert_eq!(changed, 1);

        let reloaded = QueueStore::load(store).await.unwrap();
        match &reloaded.list()[1].action {
            Action::CheckOut { target, .. } => {
                assert_eq!(*target, Some(RecordRef::Server(RecordId::new(789))));
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_remap_is_rolled_back() {
        let (store, mut queue) = empty_queue().await;
        let temp = TempId::new();
        queue.append(check_out("S42", temp)).await.unwrap();
        store.set_fail_writes(true);

        assert!(queue.remap_references(temp, RecordId::new(1)).await.is_err());
        assert!(queue.peek_front().unwrap().action.references(temp));
    }

    #[tokio::test]
    async fn test_record_front_failure() {
        let (_store, mut queue) = empty_queue().await;
        queue.append(check_in("A")).await.unwrap();

        queue.record_front_failure("request timed out").await.unwrap();
        let front = queue.peek_front().unwrap();
        assert_eq!(front.retry_count, 1);
        assert_eq!(front.last_error.as_deref(), Some("request timed out"));
    }
}
