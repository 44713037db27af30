//! Rollcall Remote - Attendance server adapter
//!
//! Provides the async client for:
//! - Check-in, check-out and scanner submissions with replay metadata
//! - Authoritative snapshot fetch
//! - Backend health probing
//! - The server push (live-update) stream
//!
//! ## Modules
//!
//! - [`client`] - HTTP mechanics and transport error mapping
//! - [`provider`] - `IAttendanceService` / `IHealthProbe` implementation
//! - [`events`] - Auto-reconnecting server-sent events subscription over
//!   `reqwest-eventsource`

pub mod client;
pub mod events;
pub mod provider;

pub use client::{KioskClient, ServerRoutes};
pub use events::LiveUpdateChannel;
pub use provider::HttpAttendanceService;

use thiserror::Error;

/// Header identifying this kiosk installation
pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

/// Header present on re-deliveries of queued actions
pub const REPLAY_HEADER: &str = "X-Replay";

/// Header carrying the action id
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Errors that can occur while constructing the client
#[derive(Debug, Error)]
pub enum ClientSetupError {
    /// The configured base URL could not be parsed
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(String),
}
