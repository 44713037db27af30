//! HttpAttendanceService - IAttendanceService implementation over HTTP
//!
//! Wraps the [`KioskClient`] and translates between the server's JSON shapes
//! and the port DTOs of `rollcall-core`.
//!
//! ## Design Notes
//!
//! - The server identifies subjects by `system_id` and records by `log_id`;
//!   both may arrive as JSON numbers or strings.
//! - `initial_data` nests the roster as grade → class → number → student.
//!   It is flattened into one entry per subject.
//! - Rows that fail validation are skipped with a warning rather than
//!   failing the whole snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rollcall_core::domain::{
    ActionKind, AttendanceRecord, RecordId, RecordRef, RosterEntry, Seat, SubjectRef,
};
use rollcall_core::ports::{
    ActionAck, CheckInRequest, CheckOutRequest, IAttendanceService, IHealthProbe, RemoteError,
    SnapshotData, Submission, ToggleRequest,
};

use crate::client::{ActionResponse, KioskClient};

const CHECK_IN_PATH: &str = "/api/check_in";
const CHECK_OUT_PATH: &str = "/api/check_out";
const TOGGLE_PATH: &str = "/api/qr_process";
const SNAPSHOT_PATH: &str = "/api/initial_data";

// ============================================================================
// Wire types
// ============================================================================

/// An identifier the server may send as a number or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireId {
    Int(i64),
    Text(String),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Int(n) => n.to_string(),
            WireId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InitialData {
    #[serde(default)]
    students: BTreeMap<String, BTreeMap<String, BTreeMap<String, WireStudent>>>,
    #[serde(default)]
    attendees: Vec<WireAttendee>,
    #[serde(default)]
    version: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireStudent {
    system_id: WireId,
    #[serde(default)]
    name: String,
    grade: Option<WireId>,
    class: Option<WireId>,
    student_number: Option<WireId>,
    #[serde(default)]
    is_present: bool,
    current_log_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WireAttendee {
    log_id: i64,
    system_id: WireId,
    seat_number: Option<WireId>,
    entry_time: String,
    exit_time: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckInBody<'a> {
    system_id: &'a str,
    seat_number: &'a str,
    entry_time: String,
    action_id: String,
    replay: bool,
}

#[derive(Debug, Serialize)]
struct CheckOutBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    log_id: Option<i64>,
    system_id: &'a str,
    exit_time: String,
    action_id: String,
    replay: bool,
}

#[derive(Debug, Serialize)]
struct ToggleBody<'a> {
    system_id: &'a str,
    timestamp: String,
    action_id: String,
    replay: bool,
}

// ============================================================================
// Conversions
// ============================================================================

/// Parses a server timestamp
///
/// RFC 3339 is expected; offset-less ISO timestamps are read as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RemoteError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| RemoteError::Decode(format!("invalid timestamp '{raw}': {e}")))
}

fn ack_from_response(response: ActionResponse) -> ActionAck {
    let applied = match response.action.as_deref() {
        Some("check_in") => Some(ActionKind::CheckIn),
        Some("check_out") => Some(ActionKind::CheckOut),
        _ => None,
    };
    ActionAck {
        record_id: response.log_id.map(RecordId::new),
        applied,
        message: response.message,
    }
}

fn roster_entry(student: WireStudent) -> Option<RosterEntry> {
    let raw_id = student.system_id.into_string();
    let subject = match SubjectRef::new(raw_id.clone()) {
        Ok(subject) => subject,
        Err(e) => {
            warn!(system_id = %raw_id, error = %e, "Skipping roster entry");
            return None;
        }
    };
    Some(RosterEntry {
        subject,
        name: student.name,
        grade: student.grade.map(WireId::into_string),
        class: student.class.map(WireId::into_string),
        number: student.student_number.map(WireId::into_string),
        is_present: student.is_present,
        current_record: student.current_log_id.map(RecordId::new),
    })
}

fn attendance_record(attendee: WireAttendee) -> Option<AttendanceRecord> {
    let raw_id = attendee.system_id.into_string();
    let convert = || -> Result<AttendanceRecord, String> {
        let subject = SubjectRef::new(raw_id.clone()).map_err(|e| e.to_string())?;
        let entry_time = parse_timestamp(&attendee.entry_time).map_err(|e| e.to_string())?;
        let exit_time = attendee
            .exit_time
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(|e| e.to_string())?;
        // Scanner check-ins have no seat.
        let seat = attendee
            .seat_number
            .clone()
            .and_then(|s| Seat::new(s.into_string()).ok());
        Ok(AttendanceRecord {
            record_id: RecordRef::Server(RecordId::new(attendee.log_id)),
            subject,
            seat,
            entry_time,
            exit_time,
            pending: false,
        })
    };

    match convert() {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(log_id = attendee.log_id, system_id = %raw_id, error = %e, "Skipping attendance record");
            None
        }
    }
}

fn snapshot_from_wire(data: InitialData) -> SnapshotData {
    let roster = data
        .students
        .into_values()
        .flat_map(BTreeMap::into_values)
        .flat_map(BTreeMap::into_values)
        .filter_map(roster_entry)
        .collect();
    let records = data
        .attendees
        .into_iter()
        .filter_map(attendance_record)
        .collect();

    SnapshotData {
        roster,
        records,
        version: data.version,
    }
}

// ============================================================================
// HttpAttendanceService
// ============================================================================

/// Attendance server adapter
#[derive(Debug, Clone)]
pub struct HttpAttendanceService {
    client: Arc<KioskClient>,
    probe_timeout: Duration,
}

impl HttpAttendanceService {
    /// Creates a new service around a shared client
    pub fn new(client: Arc<KioskClient>, probe_timeout: Duration) -> Self {
        Self {
            client,
            probe_timeout,
        }
    }

    /// Returns the shared client
    pub fn client(&self) -> &Arc<KioskClient> {
        &self.client
    }
}

#[async_trait::async_trait]
impl IAttendanceService for HttpAttendanceService {
    async fn submit_check_in(
        &self,
        request: &CheckInRequest,
        submission: Submission,
    ) -> Result<ActionAck, RemoteError> {
        let body = CheckInBody {
            system_id: request.subject.as_str(),
            seat_number: request.seat.as_str(),
            entry_time: request.entry_time.to_rfc3339(),
            action_id: submission.action_id.to_string(),
            replay: submission.replay,
        };
        let response = self
            .client
            .post_action(CHECK_IN_PATH, &body, submission)
            .await?;
        Ok(ack_from_response(response))
    }

    async fn submit_check_out(
        &self,
        request: &CheckOutRequest,
        submission: Submission,
    ) -> Result<ActionAck, RemoteError> {
        let body = CheckOutBody {
            log_id: request.record.map(|id| id.value()),
            system_id: request.subject.as_str(),
            exit_time: request.exit_time.to_rfc3339(),
            action_id: submission.action_id.to_string(),
            replay: submission.replay,
        };
        let response = self
            .client
            .post_action(CHECK_OUT_PATH, &body, submission)
            .await?;
        Ok(ack_from_response(response))
    }

    async fn submit_toggle(
        &self,
        request: &ToggleRequest,
        submission: Submission,
    ) -> Result<ActionAck, RemoteError> {
        let body = ToggleBody {
            system_id: request.subject.as_str(),
            timestamp: request.at.to_rfc3339(),
            action_id: submission.action_id.to_string(),
            replay: submission.replay,
        };
        let response = self
            .client
            .post_action(TOGGLE_PATH, &body, submission)
            .await?;
        Ok(ack_from_response(response))
    }

    async fn fetch_snapshot(&self) -> Result<SnapshotData, RemoteError> {
        let data: InitialData = self.client.get_json(SNAPSHOT_PATH).await?;
        let snapshot = snapshot_from_wire(data);
        debug!(
            roster = snapshot.roster.len(),
            records = snapshot.records.len(),
            version = ?snapshot.version,
            "Fetched snapshot"
        );
        Ok(snapshot)
    }
}

#[async_trait::async_trait]
impl IHealthProbe for HttpAttendanceService {
    async fn probe(&self) -> Result<(), RemoteError> {
        self.client.health(self.probe_timeout).await
    }
}
