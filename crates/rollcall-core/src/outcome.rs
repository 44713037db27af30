//! Outcome classification
//!
//! [`classify`] is the one place where a transport result is turned into a
//! decision. Nothing else in the workspace inspects HTTP status codes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ports::{ActionAck, RemoteError};

/// Status meaning "this action was already applied"
pub const CONFLICT_STATUS: u16 = 409;

/// Client-error statuses that are still worth retrying
const RETRYABLE_CLIENT_STATUSES: &[u16] = &[408, 429];

/// Error taxonomy surfaced to callers and operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Timeout, refused connection, server-side failure; retried in order
    TransientNetwork,
    /// The server already holds this action
    ServerConflict,
    /// The server refused the action; moved to the dead-letter list
    ServerRejected,
    /// The local store could not persist a mutation
    PersistenceFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::TransientNetwork => "transient network failure",
            ErrorKind::ServerConflict => "already applied",
            ErrorKind::ServerRejected => "rejected by server",
            ErrorKind::PersistenceFailure => "local store failure",
        })
    }
}

/// What the engine should do with a delivered action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Applied; remap if the ack carries a new record id, then remove
    Success(ActionAck),
    /// Already applied elsewhere; remove without remap
    Conflict { message: String },
    /// Not retryable; quarantine and continue
    Rejected { status: u16, message: String },
    /// Keep at the front and stop draining
    Transient { reason: String },
}

impl Outcome {
    /// Returns the taxonomy kind for failures, `None` for success
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Conflict { .. } => Some(ErrorKind::ServerConflict),
            Outcome::Rejected { .. } => Some(ErrorKind::ServerRejected),
            Outcome::Transient { .. } => Some(ErrorKind::TransientNetwork),
        }
    }
}

/// Maps a transport result onto the engine's decision
pub fn classify(result: &Result<ActionAck, RemoteError>) -> Outcome {
    match result {
        Ok(ack) => Outcome::Success(ack.clone()),
        Err(RemoteError::Status { status, message }) => match *status {
            CONFLICT_STATUS => Outcome::Conflict {
                message: message.clone(),
            },
            s if RETRYABLE_CLIENT_STATUSES.contains(&s) => Outcome::Transient {
                reason: format!("HTTP {s}: {message}"),
            },
            400..=499 => Outcome::Rejected {
                status: *status,
                message: message.clone(),
            },
            s => Outcome::Transient {
                reason: format!("HTTP {s}: {message}"),
            },
        },
        Err(
            err @ (RemoteError::Timeout
            | RemoteError::Connect(_)
            | RemoteError::Decode(_)
            | RemoteError::Transport(_)),
        ) => Outcome::Transient {
            reason: err.to_string(),
        },
    }
}
