//! Pending actions
//!
//! A [`PendingAction`] is a fact the kiosk decided happened locally but that
//! the server has not acknowledged yet. The payload is the closed
//! [`Action`] variant; every place that interprets an action matches it
//! exhaustively.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{RecordId, RecordRef, Seat, SubjectRef, TempId};

/// Kind-specific payload of a user action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Manual check-in with an explicit seat
    CheckIn {
        subject: SubjectRef,
        seat: Seat,
        entry_time: DateTime<Utc>,
    },
    /// Manual check-out, optionally naming the record to close
    CheckOut {
        subject: SubjectRef,
        target: Option<RecordRef>,
        exit_time: DateTime<Utc>,
    },
    /// Scanner input; check-in or check-out depending on state at apply time
    Toggle { subject: SubjectRef, at: DateTime<Utc> },
}

impl Action {
    /// Returns the discriminant of this action
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::CheckIn { .. } => ActionKind::CheckIn,
            Action::CheckOut { .. } => ActionKind::CheckOut,
            Action::Toggle { .. } => ActionKind::Toggle,
        }
    }

    /// Returns the subject the action applies to
    #[must_use]
    pub fn subject(&self) -> &SubjectRef {
        match self {
            Action::CheckIn { subject, .. }
            | Action::CheckOut { subject, .. }
            | Action::Toggle { subject, .. } => subject,
        }
    }

    /// Returns the moment the action happened at the kiosk
    #[must_use]
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Action::CheckIn { entry_time, .. } => *entry_time,
            Action::CheckOut { exit_time, .. } => *exit_time,
            Action::Toggle { at, .. } => *at,
        }
    }

    /// Returns true if any payload field references `temp`
    #[must_use]
    pub fn references(&self, temp: TempId) -> bool {
        match self {
            Action::CheckOut {
                target: Some(RecordRef::Temp(id)),
                ..
            } => *id == temp,
            Action::CheckIn { .. } | Action::CheckOut { .. } | Action::Toggle { .. } => false,
        }
    }

    /// Replaces references to `old` with the server id `new`
    ///
    /// Returns true if the payload changed.
    pub fn remap(&mut self, old: TempId, new: RecordId) -> bool {
        match self {
            Action::CheckOut { target, .. } => match target {
                Some(RecordRef::Temp(id)) if *id == old => {
                    *target = Some(RecordRef::Server(new));
                    true
                }
                _ => false,
            },
            Action::CheckIn { .. } | Action::Toggle { .. } => false,
        }
    }
}

/// Discriminant of [`Action`], used for display and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CheckIn,
    CheckOut,
    Toggle,
}

impl ActionKind {
    /// Returns the canonical snake_case name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::CheckIn => "check_in",
            ActionKind::CheckOut => "check_out",
            ActionKind::Toggle => "toggle",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An action waiting in the durable queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    /// Temp id; doubles as the idempotency key sent to the server
    pub id: TempId,
    /// What happened
    pub action: Action,
    /// When the action entered the queue
    pub queued_at: DateTime<Utc>,
    /// Failed delivery attempts (diagnostic only)
    #[serde(default)]
    pub retry_count: u32,
    /// Last delivery error (diagnostic only)
    #[serde(default)]
    pub last_error: Option<String>,
}

impl PendingAction {
    /// Wraps an action with a fresh temp id
    #[must_use]
    pub fn new(action: Action, queued_at: DateTime<Utc>) -> Self {
        Self {
            id: TempId::new(),
            action,
            queued_at,
            retry_count: 0,
            last_error: None,
        }
    }

    /// Returns the discriminant of the wrapped action
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    /// Records a failed delivery attempt
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.retry_count += 1;
        self.last_error = Some(error.into());
    }
}
