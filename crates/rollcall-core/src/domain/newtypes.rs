//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for identifiers used by the
//! kiosk. Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Prefix used when a temp id is rendered as text
const TEMP_ID_PREFIX: &str = "tmp-";

// ============================================================================
// TempId
// ============================================================================

/// Client-generated placeholder identifier
///
/// Assigned to every pending action at enqueue time. For a check-in it also
/// names the optimistic record until the server assigns a [`RecordId`].
/// Stable across persistence reloads because it is stored with the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(Uuid);

impl TempId {
    /// Create a new random TempId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a TempId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TempId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TempId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{TEMP_ID_PREFIX}{}", self.0)
    }
}

impl FromStr for TempId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(TEMP_ID_PREFIX).unwrap_or(s);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid TempId: {e}")))
    }
}

// ============================================================================
// RecordId
// ============================================================================

/// Server-assigned attendance record identifier (the server's log id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Wrap a server-assigned id
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw integer value
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ============================================================================
// RecordRef
// ============================================================================

/// Reference to an attendance record that may not be confirmed yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordRef {
    /// Authoritative, server-assigned id
    Server(RecordId),
    /// Optimistic record named by the temp id of its check-in
    Temp(TempId),
}

impl RecordRef {
    /// Returns the server id if this reference is authoritative
    #[must_use]
    pub fn server_id(&self) -> Option<RecordId> {
        match self {
            RecordRef::Server(id) => Some(*id),
            RecordRef::Temp(_) => None,
        }
    }

    /// Returns true if the reference still points at an unconfirmed record
    #[must_use]
    pub fn is_temp(&self) -> bool {
        matches!(self, RecordRef::Temp(_))
    }
}

impl Display for RecordRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Server(id) => write!(f, "{id}"),
            RecordRef::Temp(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for RecordRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with(TEMP_ID_PREFIX) {
            return s.parse::<TempId>().map(RecordRef::Temp);
        }
        s.parse::<i64>()
            .map(|id| RecordRef::Server(RecordId::new(id)))
            .map_err(|_| DomainError::InvalidRecordRef(s.to_string()))
    }
}

impl From<RecordId> for RecordRef {
    fn from(id: RecordId) -> Self {
        RecordRef::Server(id)
    }
}

impl From<TempId> for RecordRef {
    fn from(id: TempId) -> Self {
        RecordRef::Temp(id)
    }
}

// ============================================================================
// SubjectRef
// ============================================================================

/// Identifier of the person checking in or out (the student's system id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectRef(String);

impl SubjectRef {
    /// Create a new SubjectRef
    ///
    /// # Errors
    /// Returns error if the value is empty or contains whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidSubject(
                "Subject cannot be empty".to_string(),
            ));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidSubject(format!(
                "Subject contains whitespace: {id}"
            )));
        }
        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubjectRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SubjectRef {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SubjectRef> for String {
    fn from(id: SubjectRef) -> Self {
        id.0
    }
}

// ============================================================================
// Seat
// ============================================================================

/// Seat label chosen at check-in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Seat(String);

impl Seat {
    /// Create a new Seat
    ///
    /// # Errors
    /// Returns error if the label is empty after trimming
    pub fn new(label: impl Into<String>) -> Result<Self, DomainError> {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidSeat("Seat cannot be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Seat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Seat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Seat {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Seat> for String {
    fn from(seat: Seat) -> Self {
        seat.0
    }
}

// ============================================================================
// ClientId
// ============================================================================

/// Per-installation identifier sent with every request and push subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Create a new random ClientId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ClientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClientId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid ClientId: {e}")))
    }
}
