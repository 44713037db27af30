//! Kiosk identity
//!
//! Every request carries a client id. It comes from configuration when set,
//! otherwise it is generated once and kept in the local store.

use std::str::FromStr;

use tracing::info;

use rollcall_core::domain::ClientId;
use rollcall_core::ports::IKeyValueStore;

use crate::persist::{load_json, save_json, CLIENT_ID_KEY};
use crate::SyncError;

/// Resolves the client id for this installation
///
/// # Errors
/// Returns [`SyncError::Domain`] if `configured` is not a valid id and
/// [`SyncError::Persistence`] if a generated id cannot be saved.
pub async fn load_client_id(
    store: &dyn IKeyValueStore,
    configured: Option<&str>,
) -> Result<ClientId, SyncError> {
    if let Some(raw) = configured {
        return Ok(ClientId::from_str(raw)?);
    }

    if let Some(stored) = load_json::<String>(store, CLIENT_ID_KEY).await? {
        if let Ok(id) = ClientId::from_str(&stored) {
            return Ok(id);
        }
    }

    let id = ClientId::new();
    save_json(store, CLIENT_ID_KEY, &id.to_string()).await?;
    info!(client_id = %id, "Generated client id");
    Ok(id)
}
