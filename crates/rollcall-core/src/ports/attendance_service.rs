//! Attendance service port (driven/secondary port)
//!
//! This module defines the interface to the attendance server: the three
//! action submissions, the snapshot fetch and the health probe.
//!
//! ## Design Notes
//!
//! - Unlike the storage port, failures here use the typed [`RemoteError`]
//!   because the sync engine must classify every outcome
//!   (see [`crate::outcome::classify`]).
//! - Every submission carries a [`Submission`] describing the idempotency
//!   key and whether the call is a replay of a queued action.
//! - Requests and replies are port-level DTOs; the HTTP shape lives in the
//!   `rollcall-remote` adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    action::ActionKind,
    newtypes::{RecordId, Seat, SubjectRef, TempId},
    record::{AttendanceRecord, RosterEntry},
};

// ============================================================================
// RemoteError
// ============================================================================

/// Transport-level failure of a call to the attendance server
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The call did not complete within its deadline
    #[error("request timed out")]
    Timeout,

    /// The server could not be reached at all
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered with a non-success status
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// A response body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Any other transport failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Returns the HTTP status if the server answered
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Delivery metadata attached to every submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    /// Idempotency key; the pending action's temp id
    pub action_id: TempId,
    /// True when re-sending a queued action
    pub replay: bool,
}

impl Submission {
    /// First, direct attempt of a fresh action
    #[must_use]
    pub fn direct(action_id: TempId) -> Self {
        Self {
            action_id,
            replay: false,
        }
    }

    /// Re-delivery of a queued action
    #[must_use]
    pub fn replay(action_id: TempId) -> Self {
        Self {
            action_id,
            replay: true,
        }
    }
}

/// Manual check-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInRequest {
    pub subject: SubjectRef,
    pub seat: Seat,
    pub entry_time: DateTime<Utc>,
}

/// Manual check-out
///
/// `record` is `None` when the caller has no confirmed server id; the server
/// then closes the subject's open record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutRequest {
    pub subject: SubjectRef,
    pub record: Option<RecordId>,
    pub exit_time: DateTime<Utc>,
}

/// Scanner toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleRequest {
    pub subject: SubjectRef,
    pub at: DateTime<Utc>,
}

// ============================================================================
// Replies
// ============================================================================

/// Server acknowledgement of an applied action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAck {
    /// Server id of the record the action created or closed
    pub record_id: Option<RecordId>,
    /// For toggles, which effect the server applied
    pub applied: Option<ActionKind>,
    /// Human-readable server message
    pub message: Option<String>,
}

impl ActionAck {
    /// Returns the server id assigned to a newly opened record, if any
    ///
    /// Only check-ins (direct, or a toggle the server applied as a check-in)
    /// open records.
    #[must_use]
    pub fn opened_record(&self, submitted: ActionKind) -> Option<RecordId> {
        let opened = match submitted {
            ActionKind::CheckIn => true,
            ActionKind::Toggle => self.applied == Some(ActionKind::CheckIn),
            ActionKind::CheckOut => false,
        };
        if opened {
            self.record_id
        } else {
            None
        }
    }
}

/// Authoritative state as returned by the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotData {
    pub roster: Vec<RosterEntry>,
    pub records: Vec<AttendanceRecord>,
    /// Server-side version, when provided
    pub version: Option<u64>,
}

// ============================================================================
// Ports
// ============================================================================

/// Port trait for the remote attendance service
///
/// Implementations must bound every call by a timeout and map it to
/// [`RemoteError::Timeout`]; the engine relies on calls never hanging.
#[async_trait::async_trait]
pub trait IAttendanceService: Send + Sync {
    /// Records an arrival with an explicit seat
    async fn submit_check_in(
        &self,
        request: &CheckInRequest,
        submission: Submission,
    ) -> Result<ActionAck, RemoteError>;

    /// Records a departure
    async fn submit_check_out(
        &self,
        request: &CheckOutRequest,
        submission: Submission,
    ) -> Result<ActionAck, RemoteError>;

    /// Records a scan; the server decides between check-in and check-out
    async fn submit_toggle(
        &self,
        request: &ToggleRequest,
        submission: Submission,
    ) -> Result<ActionAck, RemoteError>;

    /// Fetches the full authoritative state
    async fn fetch_snapshot(&self) -> Result<SnapshotData, RemoteError>;
}

/// Port trait for the lightweight backend reachability check
#[async_trait::async_trait]
pub trait IHealthProbe: Send + Sync {
    /// Returns `Ok` if the backend answered with a success status
    async fn probe(&self) -> Result<(), RemoteError>;
}
