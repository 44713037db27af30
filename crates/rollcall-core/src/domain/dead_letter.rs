//! Dead-letter entries
//!
//! Actions the server rejected with a non-retryable client error. They stay
//! visible to the operator until explicitly acknowledged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{action::PendingAction, newtypes::TempId};

/// A pending action the engine gave up delivering automatically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub action: PendingAction,
    /// HTTP status the server answered with
    pub status: u16,
    /// Server message or transport detail
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

impl DeadLetter {
    /// Returns the id of the quarantined action
    #[must_use]
    pub fn id(&self) -> TempId {
        self.action.id
    }
}
