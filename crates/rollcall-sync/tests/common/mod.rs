//! Shared fixtures for sync engine tests
//!
//! [`FakeServer`] is a scripted in-memory attendance server. It records every
//! call it receives in order, keeps a minimal attendance table and answers
//! 409 when it sees an action id twice.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use rollcall_core::domain::{
    ActionKind, AttendanceRecord, RecordId, RecordRef, Seat, SubjectRef, TempId,
};
use rollcall_core::ports::{
    ActionAck, CheckInRequest, CheckOutRequest, IAttendanceService, IHealthProbe, ManualClock,
    MemoryKeyValueStore, RemoteError, SnapshotData, Submission, ToggleRequest,
};
use rollcall_sync::{EngineSettings, NetworkMonitor, SyncEngine};

/// One call as seen by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: ActionKind,
    pub action_id: TempId,
    pub replay: bool,
    pub subject: String,
    pub record: Option<RecordId>,
}

/// Scripted behavior for the next action call
#[derive(Debug, Clone)]
pub enum Step {
    /// Apply normally
    Normal,
    /// Fail without applying
    Fail(RemoteError),
    /// Apply, then lose the response
    ApplyThenFail(RemoteError),
}

#[derive(Default)]
struct ServerState {
    records: Vec<AttendanceRecord>,
    next_id: i64,
    seen: HashSet<TempId>,
    calls: Vec<Call>,
    script: VecDeque<Step>,
    version: u64,
    snapshot_fetches: u32,
    failing_snapshots: u32,
}

pub struct FakeServer {
    online: AtomicBool,
    delay: Mutex<Duration>,
    state: Mutex<ServerState>,
}

impl FakeServer {
    pub fn new(first_record_id: i64) -> Self {
        Self {
            online: AtomicBool::new(true),
            delay: Mutex::new(Duration::ZERO),
            state: Mutex::new(ServerState {
                next_id: first_record_id,
                ..ServerState::default()
            }),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn script(&self, steps: impl IntoIterator<Item = Step>) {
        self.state.lock().unwrap().script.extend(steps);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.state.lock().unwrap().records.clone()
    }

    /// Makes the next `count` snapshot fetches answer 503
    pub fn fail_snapshots(&self, count: u32) {
        self.state.lock().unwrap().failing_snapshots = count;
    }

    pub fn snapshot_fetches(&self) -> u32 {
        self.state.lock().unwrap().snapshot_fetches
    }

    /// Adds a record as if another kiosk had checked someone in
    pub fn insert_external(&self, subject: &str, at: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.version += 1;
        state.records.push(AttendanceRecord {
            record_id: RecordRef::Server(RecordId::new(id)),
            subject: SubjectRef::new(subject).unwrap(),
            seat: None,
            entry_time: at,
            exit_time: None,
            pending: false,
        });
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Connect("connection refused".into()))
        }
    }

    async fn handle(
        &self,
        call: Call,
        seat: Option<Seat>,
        at: DateTime<Utc>,
    ) -> Result<ActionAck, RemoteError> {
        self.check_online()?;
        let step = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call.clone());
            state.script.pop_front().unwrap_or(Step::Normal)
        };

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match step {
            Step::Normal => self.apply(&call, seat, at),
            Step::Fail(err) => Err(err),
            Step::ApplyThenFail(err) => {
                let _ = self.apply(&call, seat, at);
                Err(err)
            }
        }
    }

    fn apply(
        &self,
        call: &Call,
        seat: Option<Seat>,
        at: DateTime<Utc>,
    ) -> Result<ActionAck, RemoteError> {
        let mut state = self.state.lock().unwrap();
        if state.seen.contains(&call.action_id) {
            return Err(conflict("duplicate action"));
        }

        let subject = SubjectRef::new(call.subject.clone()).unwrap();
        let open = state
            .records
            .iter()
            .position(|r| r.subject == subject && r.exit_time.is_none());

        let effect = match call.kind {
            ActionKind::CheckIn => ActionKind::CheckIn,
            ActionKind::CheckOut => ActionKind::CheckOut,
            ActionKind::Toggle if open.is_some() => ActionKind::CheckOut,
            ActionKind::Toggle => ActionKind::CheckIn,
        };

        let record_id = match effect {
            ActionKind::CheckIn => {
                if open.is_some() {
                    return Err(conflict("already checked in"));
                }
                let id = state.next_id;
                state.next_id += 1;
                state.records.push(AttendanceRecord {
                    record_id: RecordRef::Server(RecordId::new(id)),
                    subject,
                    seat,
                    entry_time: at,
                    exit_time: None,
                    pending: false,
                });
                RecordId::new(id)
            }
            _ => {
                let index = match call.record {
                    Some(id) => state.records.iter().position(|r| {
                        r.record_id == RecordRef::Server(id) && r.exit_time.is_none()
                    }),
                    None => open,
                };
                let Some(index) = index else {
                    return Err(conflict("not checked in"));
                };
                state.records[index].exit_time = Some(at);
                match state.records[index].record_id {
                    RecordRef::Server(id) => id,
                    RecordRef::Temp(_) => unreachable!("server records have server ids"),
                }
            }
        };

        state.seen.insert(call.action_id);
        state.version += 1;
        Ok(ActionAck {
            record_id: Some(record_id),
            applied: Some(effect),
            message: None,
        })
    }
}

fn conflict(message: &str) -> RemoteError {
    RemoteError::Status {
        status: 409,
        message: message.into(),
    }
}

pub fn rejected(status: u16, message: &str) -> RemoteError {
    RemoteError::Status {
        status,
        message: message.into(),
    }
}

#[async_trait::async_trait]
impl IAttendanceService for FakeServer {
    async fn submit_check_in(
        &self,
        request: &CheckInRequest,
        submission: Submission,
    ) -> Result<ActionAck, RemoteError> {
        let call = Call {
            kind: ActionKind::CheckIn,
            action_id: submission.action_id,
            replay: submission.replay,
            subject: request.subject.to_string(),
            record: None,
        };
        self.handle(call, Some(request.seat.clone()), request.entry_time)
            .await
    }

    async fn submit_check_out(
        &self,
        request: &CheckOutRequest,
        submission: Submission,
    ) -> Result<ActionAck, RemoteError> {
        let call = Call {
            kind: ActionKind::CheckOut,
            action_id: submission.action_id,
            replay: submission.replay,
            subject: request.subject.to_string(),
            record: request.record,
        };
        self.handle(call, None, request.exit_time).await
    }

    async fn submit_toggle(
        &self,
        request: &ToggleRequest,
        submission: Submission,
    ) -> Result<ActionAck, RemoteError> {
        let call = Call {
            kind: ActionKind::Toggle,
            action_id: submission.action_id,
            replay: submission.replay,
            subject: request.subject.to_string(),
            record: None,
        };
        self.handle(call, None, request.at).await
    }

    async fn fetch_snapshot(&self) -> Result<SnapshotData, RemoteError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        state.snapshot_fetches += 1;
        if state.failing_snapshots > 0 {
            state.failing_snapshots -= 1;
            return Err(RemoteError::Status {
                status: 503,
                message: "snapshot unavailable".into(),
            });
        }
        Ok(SnapshotData {
            roster: Vec::new(),
            records: state.records.clone(),
            version: Some(state.version),
        })
    }
}

#[async_trait::async_trait]
impl IHealthProbe for FakeServer {
    async fn probe(&self) -> Result<(), RemoteError> {
        self.check_online()
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 8, 30, 0).unwrap()
}

pub fn subject(id: &str) -> SubjectRef {
    SubjectRef::new(id).unwrap()
}

pub fn seat(label: &str) -> Seat {
    Seat::new(label).unwrap()
}

/// An engine wired to a fake server, memory store and manual clock
pub struct Harness {
    pub server: Arc<FakeServer>,
    pub store: Arc<MemoryKeyValueStore>,
    pub clock: Arc<ManualClock>,
    pub monitor: Arc<NetworkMonitor>,
    pub engine: Arc<SyncEngine>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_options(false).await
    }

    pub async fn with_options(local_trusted: bool) -> Self {
        let server = Arc::new(FakeServer::new(789));
        let store = Arc::new(MemoryKeyValueStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let monitor = Arc::new(NetworkMonitor::new(
            server.clone(),
            Duration::from_secs(15),
            Duration::from_secs(3),
            local_trusted,
        ));
        let engine = open_engine(&server, &store, &clock, &monitor).await;
        Self {
            server,
            store,
            clock,
            monitor,
            engine,
        }
    }

    /// Builds a second engine over the same store, as after a restart
    pub async fn reopen(&self) -> Arc<SyncEngine> {
        open_engine(&self.server, &self.store, &self.clock, &self.monitor).await
    }

    /// Takes the network away without any call being made
    pub fn go_offline(&self) {
        self.server.set_online(false);
        self.monitor.set_link_up(false);
    }

    /// Restores the network and lets the monitor notice
    pub async fn go_online(&self) {
        self.server.set_online(true);
        self.monitor.set_link_up(true);
        self.monitor.probe_once().await;
    }
}

async fn open_engine(
    server: &Arc<FakeServer>,
    store: &Arc<MemoryKeyValueStore>,
    clock: &Arc<ManualClock>,
    monitor: &Arc<NetworkMonitor>,
) -> Arc<SyncEngine> {
    let settings = EngineSettings {
        retry_base_delay: Duration::from_secs(1),
        retry_max_delay: Duration::from_secs(8),
        duplicate_window: Duration::from_secs(5),
    };
    let engine = SyncEngine::open(
        server.clone(),
        monitor.clone(),
        store.clone(),
        clock.clone(),
        settings,
    )
    .await
    .expect("engine should open");
    Arc::new(engine)
}
