//! Domain entities and business logic
//!
//! This module contains the core domain types for Rollcall:
//! - Newtypes for identifiers and validated values
//! - Pending actions and their kinds
//! - Attendance records, roster entries and snapshots
//! - Dead-letter entries
//! - Scanner input normalization
//! - Domain-specific error types

pub mod action;
pub mod dead_letter;
pub mod errors;
pub mod newtypes;
pub mod record;
pub mod scan;

// Re-export commonly used types
pub use action::{Action, ActionKind, PendingAction};
pub use dead_letter::DeadLetter;
pub use errors::DomainError;
pub use newtypes::*;
pub use record::{AttendanceRecord, RosterEntry, Snapshot};
pub use scan::{normalize_scan, ScanGate};
