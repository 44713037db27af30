//! Integration tests for rollcall-remote
//!
//! Uses wiremock to simulate the attendance server and verifies
//! end-to-end behavior of the action submissions, snapshot fetch,
//! health probe and live-update stream.

mod common;

mod test_actions;
mod test_events;
mod test_health;
mod test_snapshot;
