//! Live-update notices
//!
//! The server pushes opaque "state changed" events. Receivers react by
//! refreshing the snapshot; apart from the type, the payload is only logged.

use serde::{Deserialize, Serialize};

/// Event type the server sends when authoritative state changed
pub const UPDATE_EVENT: &str = "update";

/// A single push notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotice {
    #[serde(rename = "type")]
    pub event_type: String,
    /// Human-readable text some servers attach
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChangeNotice {
    /// An "update" notice
    #[must_use]
    pub fn update() -> Self {
        Self {
            event_type: UPDATE_EVENT.to_string(),
            message: None,
        }
    }

    /// Returns true if the notice asks clients to refetch state
    #[must_use]
    pub fn is_update(&self) -> bool {
        self.event_type == UPDATE_EVENT
    }
}
