//! Attendance records and authoritative snapshots

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{RecordId, RecordRef, Seat, SubjectRef};

/// One subject's presence interval, authoritative or optimistic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Server id once confirmed, temp id while only optimistic
    pub record_id: RecordRef,
    pub subject: SubjectRef,
    /// Scanner check-ins carry no seat
    pub seat: Option<Seat>,
    pub entry_time: DateTime<Utc>,
    /// `None` while the subject is present
    pub exit_time: Option<DateTime<Utc>>,
    /// True while part of the lifecycle is still an unresolved pending action
    #[serde(default)]
    pub pending: bool,
}

impl AttendanceRecord {
    /// Returns true if the subject has not left yet
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }
}

/// Roster entry for one subject, as known by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub subject: SubjectRef,
    pub name: String,
    pub grade: Option<String>,
    pub class: Option<String>,
    pub number: Option<String>,
    pub is_present: bool,
    pub current_record: Option<RecordId>,
}

/// Last-known authoritative server state
///
/// Replaced wholesale on every successful refresh; the optimistic view is
/// computed on top of it and never written back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Local revision, bumped on every accepted refresh
    pub revision: u64,
    /// Server-supplied version, when the server provides one
    pub server_version: Option<u64>,
    /// When this snapshot was fetched; `None` for the empty boot snapshot
    pub fetched_at: Option<DateTime<Utc>>,
    /// Roster index keyed by subject
    pub roster: BTreeMap<SubjectRef, RosterEntry>,
    pub records: Vec<AttendanceRecord>,
}

impl Snapshot {
    /// Returns true if `server_version` is older than what this snapshot holds
    #[must_use]
    pub fn is_newer_than(&self, server_version: Option<u64>) -> bool {
        match (self.server_version, server_version) {
            (Some(current), Some(incoming)) => incoming < current,
            _ => false,
        }
    }

    /// Looks up a display name for a subject
    #[must_use]
    pub fn name_of(&self, subject: &SubjectRef) -> Option<&str> {
        self.roster.get(subject).map(|entry| entry.name.as_str())
    }
}
