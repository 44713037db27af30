//! Sync engine
//!
//! The [`SyncEngine`] owns the queue, the dead-letter list and the snapshot
//! cache, and is the only component that talks to the attendance service.
//!
//! ## Drain cycle
//!
//! 1. Re-read the front of the queue (never cached across a remote call)
//! 2. Replay it with its temp id as idempotency key
//! 3. Classify the result:
//!    - **Success**: remap later references to the new record id, remove
//!    - **Conflict**: already applied elsewhere, remove
//!    - **Rejected**: move to the dead-letter list, continue
//!    - **Transient**: keep at the front, stop, schedule a retry
//! 4. Refresh the snapshot if anything was settled
//!
//! ## Phases
//!
//! `Idle -> Draining -> (Idle | Backoff) -> Idle`. A drain requested while
//! another is in flight returns immediately; the running cycle picks up
//! anything enqueued meanwhile.
//!
//! ## Retry Logic
//!
//! Transient failures back off exponentially from the configured base delay
//! up to the configured maximum. Failures at the network level also mark the
//! backend unreachable, so the monitor's recovery transition resumes work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use rollcall_core::config::Config;
use rollcall_core::domain::{
    normalize_scan, Action, AttendanceRecord, DeadLetter, PendingAction, RecordId, RecordRef,
    ScanGate, Seat, Snapshot, SubjectRef, TempId,
};
use rollcall_core::outcome::{classify, ErrorKind, Outcome};
use rollcall_core::ports::{
    ActionAck, CheckInRequest, CheckOutRequest, IAttendanceService, IClock, IKeyValueStore,
    RemoteError, Submission, ToggleRequest,
};
use rollcall_core::view::{build_view_with_confirmed, ConfirmedAction};

use crate::dead_letter::DeadLetterStore;
use crate::monitor::{NetworkMonitor, NetworkState, NetworkStatus};
use crate::queue::QueueStore;
use crate::snapshot::SnapshotCache;
use crate::SyncError;

// ============================================================================
// Settings
// ============================================================================

/// Engine tuning taken from configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub duplicate_window: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retry_base_delay: config.sync.retry_base_delay(),
            retry_max_delay: config.sync.retry_max_delay(),
            duplicate_window: config.scanner.duplicate_window(),
        }
    }

    /// Delay before retry number `failures` (1-based)
    fn backoff_delay(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(31);
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.retry_max_delay)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            retry_base_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(60),
            duplicate_window: Duration::from_secs(5),
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Engine state machine position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    Draining,
    /// Waiting for a retry after a transient failure
    Backoff,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Draining => "draining",
            SyncPhase::Backoff => "backoff",
        };
        f.write_str(name)
    }
}

/// Why a drain did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Another drain cycle is running
    InFlight,
    /// Neither online nor local-trusted
    NotUsable,
}

/// Summary of one drain cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Replays the server acknowledged
    pub applied: u32,
    /// Replays the server already held (409)
    pub already_applied: u32,
    /// Replays moved to the dead-letter list
    pub dead_lettered: u32,
    /// Queued actions rewritten to a server record id
    pub remapped: usize,
    /// Actions still queued when the cycle ended
    pub remaining: usize,
    /// Transient failure that stopped the cycle
    pub stopped: Option<String>,
    pub skipped: Option<SkipReason>,
    pub snapshot_refreshed: bool,
}

impl DrainReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }

    /// Returns true if any action left the queue
    #[must_use]
    pub fn changed(&self) -> bool {
        self.applied + self.already_applied + self.dead_lettered > 0
    }
}

/// What happened to a user action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The server applied it directly
    Applied {
        action_id: TempId,
        record_id: Option<RecordId>,
        message: Option<String>,
    },
    /// The server already held an equivalent action
    AlreadyApplied { action_id: TempId, message: String },
    /// The server refused it; nothing was stored
    Rejected {
        action_id: TempId,
        status: u16,
        message: String,
    },
    /// Stored in the queue for later delivery
    Queued {
        action_id: TempId,
        /// Failure of the direct attempt, if one was made
        reason: Option<String>,
    },
}

impl SubmitOutcome {
    #[must_use]
    pub fn action_id(&self) -> TempId {
        match self {
            SubmitOutcome::Applied { action_id, .. }
            | SubmitOutcome::AlreadyApplied { action_id, .. }
            | SubmitOutcome::Rejected { action_id, .. }
            | SubmitOutcome::Queued { action_id, .. } => *action_id,
        }
    }
}

/// Result of a scanner read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Same subject scanned again inside the duplicate window
    Duplicate { subject: SubjectRef },
    Submitted {
        subject: SubjectRef,
        outcome: SubmitOutcome,
    },
}

/// Point-in-time engine status for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub phase: SyncPhase,
    pub network: NetworkStatus,
    pub pending: usize,
    pub dead_letters: usize,
    pub last_drain_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_error_kind: Option<ErrorKind>,
    pub snapshot_revision: u64,
    pub snapshot_fetched_at: Option<DateTime<Utc>>,
    /// Milliseconds until the next scheduled retry
    pub retry_in_ms: Option<u64>,
}

// ============================================================================
// SyncEngine
// ============================================================================

#[derive(Debug)]
struct EngineState {
    phase: SyncPhase,
    last_drain_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    last_error_kind: Option<ErrorKind>,
    consecutive_failures: u32,
    next_retry_at: Option<Instant>,
}

/// Acknowledged actions the held snapshot may not reflect yet
///
/// Entries are numbered so a refresh only clears what was confirmed before
/// its fetch began.
#[derive(Debug, Default)]
struct Confirmations {
    next_seq: u64,
    entries: Vec<(u64, ConfirmedAction)>,
}

impl Confirmations {
    fn push(&mut self, entry: ConfirmedAction) {
        self.entries.push((self.next_seq, entry));
        self.next_seq += 1;
    }

    /// Drops entries confirmed before `watermark`
    fn settle_before(&mut self, watermark: u64) {
        self.entries.retain(|(seq, _)| *seq >= watermark);
    }

    fn actions(&self) -> Vec<ConfirmedAction> {
        self.entries.iter().map(|(_, entry)| entry.clone()).collect()
    }
}

/// Clears the single-flight flag when a drain ends, however it ends
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Offline-resilient action queue and reconciliation engine
///
/// ## Dependencies
///
/// - `service`: the attendance server (actions and snapshots)
/// - `monitor`: decides whether the network may be used
/// - `store`: durable key/value storage for queue, dead letters, snapshot
/// - `clock`: wall-clock time for action timestamps and scan windows
pub struct SyncEngine {
    service: Arc<dyn IAttendanceService>,
    monitor: Arc<NetworkMonitor>,
    clock: Arc<dyn IClock>,
    settings: EngineSettings,
    queue: Mutex<QueueStore>,
    dead_letters: Mutex<DeadLetterStore>,
    snapshot: Mutex<SnapshotCache>,
    scan_gate: StdMutex<ScanGate>,
    /// Serializes user submissions so direct calls keep enqueue order
    submit_lock: Mutex<()>,
    draining: AtomicBool,
    state: StdMutex<EngineState>,
    confirmed: StdMutex<Confirmations>,
    wake: Notify,
}

impl SyncEngine {
    /// Restores persisted state and builds the engine
    ///
    /// # Errors
    /// Returns an error if the stored queue, dead letters or snapshot cannot
    /// be read.
    pub async fn open(
        service: Arc<dyn IAttendanceService>,
        monitor: Arc<NetworkMonitor>,
        store: Arc<dyn IKeyValueStore>,
        clock: Arc<dyn IClock>,
        settings: EngineSettings,
    ) -> Result<Self, SyncError> {
        let queue = QueueStore::load(store.clone()).await?;
        let dead_letters = DeadLetterStore::load(store.clone()).await?;
        let snapshot = SnapshotCache::load(store).await?;

        info!(
            pending = queue.len(),
            dead_letters = dead_letters.len(),
            snapshot_revision = snapshot.current().revision,
            "Sync engine opened"
        );

        Ok(Self {
            service,
            monitor,
            clock,
            scan_gate: StdMutex::new(ScanGate::new(settings.duplicate_window)),
            settings,
            queue: Mutex::new(queue),
            dead_letters: Mutex::new(dead_letters),
            snapshot: Mutex::new(snapshot),
            submit_lock: Mutex::new(()),
            draining: AtomicBool::new(false),
            state: StdMutex::new(EngineState {
                phase: SyncPhase::Idle,
                last_drain_at: None,
                last_error: None,
                last_error_kind: None,
                consecutive_failures: 0,
                next_retry_at: None,
            }),
            confirmed: StdMutex::new(Confirmations::default()),
            wake: Notify::new(),
        })
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn confirmations(&self) -> MutexGuard<'_, Confirmations> {
        self.confirmed.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn monitor(&self) -> &Arc<NetworkMonitor> {
        &self.monitor
    }

    // ========================================================================
    // User actions
    // ========================================================================

    /// Records a check-in now
    pub async fn check_in(&self, subject: SubjectRef, seat: Seat) -> Result<SubmitOutcome, SyncError> {
        let entry_time = self.clock.now();
        self.enqueue_or_submit(Action::CheckIn {
            subject,
            seat,
            entry_time,
        })
        .await
    }

    /// Records a check-out now
    pub async fn check_out(
        &self,
        subject: SubjectRef,
        target: Option<RecordRef>,
    ) -> Result<SubmitOutcome, SyncError> {
        let exit_time = self.clock.now();
        self.enqueue_or_submit(Action::CheckOut {
            subject,
            target,
            exit_time,
        })
        .await
    }

    /// Normalizes scanner text and submits it as a toggle
    ///
    /// # Errors
    /// Returns [`SyncError::Domain`] when the text holds no subject id.
    pub async fn submit_scan(&self, raw: &str) -> Result<ScanOutcome, SyncError> {
        let subject = normalize_scan(raw)?;
        let now = self.clock.now();
        let admitted = self
            .scan_gate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .admit(&subject, now);
        if !admitted {
            debug!(subject = %subject, "Duplicate scan ignored");
            return Ok(ScanOutcome::Duplicate { subject });
        }

        let outcome = self
            .enqueue_or_submit(Action::Toggle {
                subject: subject.clone(),
                at: now,
            })
            .await?;
        Ok(ScanOutcome::Submitted { subject, outcome })
    }

    /// Submits an action directly when possible, otherwise queues it
    ///
    /// A direct call is made only when the network is usable and nothing is
    /// queued; anything else would let this action overtake earlier ones.
    /// Conflicts and rejections of a direct call go back to the caller
    /// instead of the dead-letter list.
    #[tracing::instrument(skip(self, action), fields(kind = %action.kind()))]
    pub async fn enqueue_or_submit(&self, action: Action) -> Result<SubmitOutcome, SyncError> {
        let serial = self.submit_lock.lock().await;
        let pending = PendingAction::new(action, self.clock.now());
        let action_id = pending.id;
        let backlog = !self.queue.lock().await.is_empty();
        let usable = self.monitor.is_usable();

        if backlog || !usable {
            let pending_count = {
                let mut queue = self.queue.lock().await;
                queue.append(pending).await?;
                queue.len()
            };
            info!(action_id = %action_id, pending = pending_count, usable, "Action queued");
            if usable {
                self.wake.notify_one();
            }
            return Ok(SubmitOutcome::Queued {
                action_id,
                reason: None,
            });
        }

        let result = self
            .deliver(&pending.action, Submission::direct(action_id))
            .await;
        let outcome = classify(&result);
        let kind = outcome.error_kind();
        let outcome = match outcome {
            Outcome::Success(ack) => {
                info!(action_id = %action_id, record_id = ?ack.record_id, "Action applied");
                self.confirmations().push(ConfirmedAction {
                    action: pending,
                    ack: ack.clone(),
                });
                SubmitOutcome::Applied {
                    action_id,
                    record_id: ack.record_id,
                    message: ack.message,
                }
            }
            Outcome::Conflict { message } => {
                info!(action_id = %action_id, %message, "Action already applied");
                SubmitOutcome::AlreadyApplied { action_id, message }
            }
            Outcome::Rejected { status, message } => {
                warn!(action_id = %action_id, status, %message, "Action rejected");
                return Ok(SubmitOutcome::Rejected {
                    action_id,
                    status,
                    message,
                });
            }
            Outcome::Transient { reason } => {
                let mut pending = pending;
                pending.record_failure(reason.clone());
                self.queue.lock().await.append(pending).await?;
                warn!(action_id = %action_id, %reason, "Direct submission failed; action queued");
                self.enter_backoff(kind, &reason);
                return Ok(SubmitOutcome::Queued {
                    action_id,
                    reason: Some(reason),
                });
            }
        };

        drop(serial);
        if let Err(e) = self.refresh_snapshot().await {
            warn!(error = %e, "Snapshot refresh after direct submission failed");
        }
        Ok(outcome)
    }

    // ========================================================================
    // Drain
    // ========================================================================

    /// Runs one drain cycle
    ///
    /// # Errors
    /// Returns [`SyncError::Persistence`] if the queue or dead-letter list
    /// could not be written; the cycle stops and a retry is scheduled.
    #[tracing::instrument(skip(self))]
    pub async fn drain(&self) -> Result<DrainReport, SyncError> {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Drain already in flight");
            return Ok(DrainReport::skipped(SkipReason::InFlight));
        }
        let _flight = FlightGuard(&self.draining);

        // Any attempt consumes the scheduled retry.
        self.state().next_retry_at = None;

        if !self.monitor.is_usable() {
            debug!("Network not usable, drain skipped");
            return Ok(DrainReport::skipped(SkipReason::NotUsable));
        }

        self.state().phase = SyncPhase::Draining;
        let mut report = DrainReport::default();
        let result = self.drain_queue(&mut report).await;

        if report.changed() {
            match self.refresh_snapshot().await {
                Ok(_) => report.snapshot_refreshed = true,
                Err(e) => warn!(error = %e, "Snapshot refresh after drain failed"),
            }
        }
        report.remaining = self.queue.lock().await.len();
        self.state().last_drain_at = Some(self.clock.now());

        match (&result, &report.stopped) {
            (Err(e), _) => self.enter_backoff(e.error_kind(), &e.to_string()),
            (Ok(()), Some(reason)) => {
                self.enter_backoff(Some(ErrorKind::TransientNetwork), reason);
            }
            (Ok(()), None) => {
                let mut state = self.state();
                state.phase = SyncPhase::Idle;
                state.consecutive_failures = 0;
                if report.remaining == 0 {
                    state.last_error = None;
                    state.last_error_kind = None;
                }
            }
        }

        info!(
            applied = report.applied,
            already_applied = report.already_applied,
            dead_lettered = report.dead_lettered,
            remaining = report.remaining,
            "Drain cycle finished"
        );
        result.map(|()| report)
    }

    async fn drain_queue(&self, report: &mut DrainReport) -> Result<(), SyncError> {
        loop {
            if !self.monitor.is_usable() {
                debug!("Network became unusable, stopping drain");
                return Ok(());
            }
            let Some(front) = self.queue.lock().await.peek_front().cloned() else {
                return Ok(());
            };

            let result = self
                .deliver(&front.action, Submission::replay(front.id))
                .await;

            // Only this cycle removes from the queue, so the front is unchanged.
            match classify(&result) {
                Outcome::Success(ack) => {
                    let mut queue = self.queue.lock().await;
                    if let Some(record_id) = ack.opened_record(front.kind()) {
                        report.remapped += queue.remap_references(front.id, record_id).await?;
                    }
                    queue.remove_front().await?;
                    info!(
                        action_id = %front.id,
                        kind = %front.kind(),
                        record_id = ?ack.record_id,
                        "Queued action applied"
                    );
                    // Still under the queue lock: a render sees it in one place.
                    self.confirmations().push(ConfirmedAction { action: front, ack });
                    drop(queue);
                    report.applied += 1;
                }
                Outcome::Conflict { message } => {
                    self.queue.lock().await.remove_front().await?;
                    report.already_applied += 1;
                    info!(action_id = %front.id, %message, "Queued action already applied");
                }
                Outcome::Rejected { status, message } => {
                    let letter = DeadLetter {
                        action: front.clone(),
                        status,
                        reason: message,
                        failed_at: self.clock.now(),
                    };
                    // Quarantine before removing so a failed removal never loses it.
                    self.dead_letters.lock().await.push(letter).await?;
                    self.queue.lock().await.remove_front().await?;
                    report.dead_lettered += 1;
                }
                Outcome::Transient { reason } => {
                    if let Err(e) = self.queue.lock().await.record_front_failure(&reason).await {
                        warn!(action_id = %front.id, error = %e, "Failed to record delivery failure");
                    }
                    warn!(action_id = %front.id, %reason, "Transient failure, drain stopped");
                    report.stopped = Some(reason);
                    return Ok(());
                }
            }
        }
    }

    fn enter_backoff(&self, kind: Option<ErrorKind>, reason: &str) {
        let mut state = self.state();
        state.consecutive_failures += 1;
        let delay = self.settings.backoff_delay(state.consecutive_failures);
        state.phase = SyncPhase::Backoff;
        state.last_error = Some(reason.to_string());
        state.last_error_kind = kind;
        state.next_retry_at = Some(Instant::now() + delay);
        drop(state);

        debug!(delay_ms = delay.as_millis() as u64, "Retry scheduled");
        self.wake.notify_one();
    }

    // ========================================================================
    // Remote calls
    // ========================================================================

    async fn deliver(
        &self,
        action: &Action,
        submission: Submission,
    ) -> Result<ActionAck, RemoteError> {
        let result = match action {
            Action::CheckIn {
                subject,
                seat,
                entry_time,
            } => {
                let request = CheckInRequest {
                    subject: subject.clone(),
                    seat: seat.clone(),
                    entry_time: *entry_time,
                };
                self.service.submit_check_in(&request, submission).await
            }
            Action::CheckOut {
                subject,
                target,
                exit_time,
            } => {
                // An unresolved temp target is sent without a record id.
                let request = CheckOutRequest {
                    subject: subject.clone(),
                    record: target.and_then(|t| t.server_id()),
                    exit_time: *exit_time,
                };
                self.service.submit_check_out(&request, submission).await
            }
            Action::Toggle { subject, at } => {
                let request = ToggleRequest {
                    subject: subject.clone(),
                    at: *at,
                };
                self.service.submit_toggle(&request, submission).await
            }
        };
        self.observe(&result);
        result
    }

    /// Feeds call results to the monitor
    fn observe<T>(&self, result: &Result<T, RemoteError>) {
        match result {
            Ok(_) => self.monitor.report_reachable(),
            // Any HTTP answer proves the backend is there.
            Err(e) if e.status().is_some() => self.monitor.report_reachable(),
            Err(e @ (RemoteError::Timeout | RemoteError::Connect(_))) => {
                self.monitor.report_unreachable(&e.to_string());
            }
            Err(_) => {}
        }
    }

    /// Replaces the snapshot with the server's current state
    ///
    /// Returns `Ok(false)` when the fetched snapshot was stale. An accepted
    /// snapshot settles every action confirmed before the fetch began.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_snapshot(&self) -> Result<bool, SyncError> {
        let watermark = self.confirmations().next_seq;
        let result = self.service.fetch_snapshot().await;
        self.observe(&result);
        let data = result?;
        let fetched_at = self.clock.now();
        let accepted = self.snapshot.lock().await.replace(data, fetched_at).await?;
        if accepted {
            self.confirmations().settle_before(watermark);
        }
        Ok(accepted)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The records the kiosk should show
    ///
    /// Actions confirmed since the last accepted refresh are shown as settled
    /// even when that refresh failed.
    pub async fn rendered_records(&self) -> Vec<AttendanceRecord> {
        let snapshot = self.snapshot.lock().await;
        let queue = self.queue.lock().await;
        let confirmed = self.confirmations().actions();
        build_view_with_confirmed(snapshot.current(), &confirmed, &queue.list())
    }

    /// Number of confirmed actions the held snapshot may not show yet
    pub fn unrefreshed_confirmations(&self) -> usize {
        self.confirmations().entries.len()
    }

    pub fn current_network_state(&self) -> NetworkState {
        self.monitor.state()
    }

    pub async fn dead_letter_count(&self) -> usize {
        self.dead_letters.lock().await.len()
    }

    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.lock().await.list().to_vec()
    }

    /// Removes a dead letter after operator review
    pub async fn acknowledge_dead_letter(&self, id: TempId) -> Result<DeadLetter, SyncError> {
        self.dead_letters.lock().await.acknowledge(id).await
    }

    pub async fn pending_actions(&self) -> Vec<PendingAction> {
        self.queue.lock().await.list()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.lock().await.current().clone()
    }

    pub fn phase(&self) -> SyncPhase {
        self.state().phase
    }

    /// When the next retry is due, if one is scheduled
    pub fn next_retry_at(&self) -> Option<Instant> {
        self.state().next_retry_at
    }

    /// Resolves when the engine wants the scheduler to look again
    pub async fn woken(&self) {
        self.wake.notified().await;
    }

    pub async fn status(&self) -> EngineStatus {
        let pending = self.queue.lock().await.len();
        let dead_letters = self.dead_letters.lock().await.len();
        let (snapshot_revision, snapshot_fetched_at) = {
            let cache = self.snapshot.lock().await;
            (cache.current().revision, cache.current().fetched_at)
        };
        let state = self.state();
        let now = Instant::now();

        EngineStatus {
            phase: state.phase,
            network: self.monitor.status(),
            pending,
            dead_letters,
            last_drain_at: state.last_drain_at,
            last_error: state.last_error.clone(),
            last_error_kind: state.last_error_kind,
            snapshot_revision,
            snapshot_fetched_at,
            retry_in_ms: state
                .next_retry_at
                .map(|at| at.saturating_duration_since(now).as_millis() as u64),
        }
    }
}
