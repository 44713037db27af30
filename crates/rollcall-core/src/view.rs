//! Optimistic view builder
//!
//! [`build_view`] overlays the pending queue on the last authoritative
//! snapshot to produce what the kiosk shows. It is a pure function: no I/O,
//! no clock, no failure. The snapshot is never modified.
//!
//! Actions the server acknowledged after the snapshot was fetched can be
//! layered in between with [`build_view_with_confirmed`], so a confirmed
//! record does not vanish while the refresh that would carry it is failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Action, ActionKind, AttendanceRecord, PendingAction, RecordRef, Seat, Snapshot, SubjectRef,
};
use crate::ports::ActionAck;

/// An action the server acknowledged that the snapshot may not show yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedAction {
    pub action: PendingAction,
    pub ack: ActionAck,
}

impl ConfirmedAction {
    /// Record id the view uses for a record this action opened
    fn opened_ref(&self) -> RecordRef {
        self.ack
            .opened_record(self.action.kind())
            .map_or(RecordRef::Temp(self.action.id), RecordRef::Server)
    }
}

/// Merges `queue` over `snapshot` and returns the records to render
///
/// Actions are applied front to back:
/// - `CheckIn` opens a pending record keyed by the action's temp id.
/// - `CheckOut` closes its explicit target when that record is present and
///   open, otherwise the subject's open record; with neither it is skipped.
/// - `Toggle` closes the subject's open record if there is one, otherwise
///   opens a new one. The choice is re-made on every call.
///
/// The result is sorted by entry time; records with equal entry times keep
/// their snapshot/queue order.
#[must_use]
pub fn build_view(snapshot: &Snapshot, queue: &[PendingAction]) -> Vec<AttendanceRecord> {
    build_view_with_confirmed(snapshot, &[], queue)
}

/// Like [`build_view`], with `confirmed` applied before the queue
///
/// Confirmed actions produce settled (non-pending) records. A check-in the
/// server assigned an id to is keyed by that id, so queued check-outs that
/// were remapped to it still find it. A confirmed check-in whose record the
/// snapshot already holds is skipped.
#[must_use]
pub fn build_view_with_confirmed(
    snapshot: &Snapshot,
    confirmed: &[ConfirmedAction],
    queue: &[PendingAction],
) -> Vec<AttendanceRecord> {
    let mut records = snapshot.records.clone();

    for entry in confirmed {
        let record_id = entry.opened_ref();
        if records.iter().any(|r| r.record_id == record_id) {
            continue;
        }
        // Toggles follow what the server reports it did, when it says.
        let effect = match (&entry.action.action, entry.ack.applied) {
            (Action::Toggle { .. }, Some(kind @ (ActionKind::CheckIn | ActionKind::CheckOut))) => {
                Some(kind)
            }
            _ => None,
        };
        apply(&mut records, &entry.action.action, record_id, effect, false);
    }

    for pending in queue {
        apply(
            &mut records,
            &pending.action,
            RecordRef::Temp(pending.id),
            None,
            true,
        );
    }

    records.sort_by_key(|record| record.entry_time);
    records
}

/// Applies one action to the working copy
///
/// `effect` forces a toggle's outcome; `None` decides from current state.
fn apply(
    records: &mut Vec<AttendanceRecord>,
    action: &Action,
    record_id: RecordRef,
    effect: Option<ActionKind>,
    pending: bool,
) {
    match action {
        Action::CheckIn {
            subject,
            seat,
            entry_time,
        } => open(
            records,
            record_id,
            subject,
            Some(seat.clone()),
            *entry_time,
            pending,
        ),
        Action::CheckOut {
            subject,
            target,
            exit_time,
        } => {
            close(records, subject, target.as_ref(), *exit_time, pending);
        }
        Action::Toggle { subject, at } => match effect {
            Some(ActionKind::CheckIn) => open(records, record_id, subject, None, *at, pending),
            Some(_) => {
                close(records, subject, None, *at, pending);
            }
            None => {
                if !close(records, subject, None, *at, pending) {
                    open(records, record_id, subject, None, *at, pending);
                }
            }
        },
    }
}

fn open(
    records: &mut Vec<AttendanceRecord>,
    record_id: RecordRef,
    subject: &SubjectRef,
    seat: Option<Seat>,
    entry_time: DateTime<Utc>,
    pending: bool,
) {
    records.push(AttendanceRecord {
        record_id,
        subject: subject.clone(),
        seat,
        entry_time,
        exit_time: None,
        pending,
    });
}

/// Closes the matching record; returns false if nothing could be closed
///
/// `pending` marks the record as still awaiting the server.
fn close(
    records: &mut [AttendanceRecord],
    subject: &SubjectRef,
    target: Option<&RecordRef>,
    exit_time: DateTime<Utc>,
    pending: bool,
) -> bool {
    let by_target = target.and_then(|target| {
        records
            .iter()
            .position(|r| r.record_id == *target && r.is_open())
    });
    let index = by_target.or_else(|| open_record_of(records, subject));

    match index {
        Some(i) => {
            let record = &mut records[i];
            record.exit_time = Some(exit_time);
            record.pending |= pending;
            true
        }
        None => false,
    }
}

/// Most recent open record for `subject`
fn open_record_of(records: &[AttendanceRecord], subject: &SubjectRef) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.subject == *subject && r.is_open())
        .max_by_key(|(_, r)| r.entry_time)
        .map(|(i, _)| i)
}
