//! Rollcall Core - Domain logic for the attendance kiosk
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `PendingAction`, `AttendanceRecord`, `Snapshot`, `DeadLetter`
//! - **Port definitions** - Traits for adapters: `IAttendanceService`, `IHealthProbe`,
//!   `IKeyValueStore`, `IClock`
//! - **Optimistic view** - The pure merge of a snapshot with the pending queue
//! - **Outcome classification** - Mapping of transport results to the error taxonomy
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement
//! (`rollcall-cache` for storage, `rollcall-remote` for HTTP).

pub mod config;
pub mod domain;
pub mod outcome;
pub mod ports;
pub mod view;
