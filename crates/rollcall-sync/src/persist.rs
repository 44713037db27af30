//! JSON documents over the key/value port

use rollcall_core::ports::IKeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::SyncError;

pub(crate) const QUEUE_KEY: &str = "queue";
pub(crate) const DEAD_LETTERS_KEY: &str = "dead_letters";
pub(crate) const SNAPSHOT_KEY: &str = "snapshot";
pub(crate) const CLIENT_ID_KEY: &str = "client_id";

pub(crate) async fn load_json<T: DeserializeOwned>(
    store: &dyn IKeyValueStore,
    key: &str,
) -> Result<Option<T>, SyncError> {
    let Some(bytes) = store.get(key).await.map_err(SyncError::persistence)? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

pub(crate) async fn save_json<T: Serialize + ?Sized>(
    store: &dyn IKeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), SyncError> {
    let bytes = serde_json::to_vec(value)?;
    store.put(key, &bytes).await.map_err(SyncError::persistence)
}
