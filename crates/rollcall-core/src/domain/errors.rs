//! Domain error types
//!
//! Validation failures raised while constructing domain values.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Subject reference is empty or malformed
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    /// Seat label is empty or malformed
    #[error("Invalid seat: {0}")]
    InvalidSeat(String),

    /// Scanner input could not be normalized to a subject id
    #[error("Invalid scan: {0}")]
    InvalidScan(String),

    /// Record reference could not be parsed
    #[error("Invalid record reference: {0}")]
    InvalidRecordRef(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
