//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IAttendanceService`] - Action submission and snapshot fetch
//! - [`IHealthProbe`] - Backend reachability check
//! - [`IKeyValueStore`] - Persistent local byte store
//! - [`IClock`] - Wall-clock time

pub mod attendance_service;
pub mod clock;
pub mod kv_store;
pub mod push_channel;

pub use attendance_service::{
    ActionAck, CheckInRequest, CheckOutRequest, IAttendanceService, IHealthProbe, RemoteError,
    SnapshotData, Submission, ToggleRequest,
};
pub use clock::{IClock, ManualClock, SystemClock};
pub use kv_store::{IKeyValueStore, MemoryKeyValueStore};
pub use push_channel::{ChangeNotice, UPDATE_EVENT};
