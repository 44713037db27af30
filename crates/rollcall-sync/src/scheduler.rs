//! Sync scheduler - turns signals into drain cycles and snapshot refreshes
//!
//! The [`SyncScheduler`] is the kiosk's single event loop around the
//! [`SyncEngine`](super::engine::SyncEngine).
//!
//! ## Flow
//!
//! ```text
//! NetworkMonitor ──watch──→ ┐
//! LiveUpdateChannel ─mpsc─→ ├──→ SyncScheduler ──→ drain() / refresh_snapshot()
//! engine wake / retry timer → ┘
//! ```
//!
//! - A transition into the usable network state triggers a drain and a
//!   snapshot refresh.
//! - A live-update notice triggers a snapshot refresh only.
//! - The engine wakes the loop when work was queued behind a backlog or a
//!   retry was scheduled; the retry deadline is re-read every iteration.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use rollcall_core::ports::ChangeNotice;

use crate::engine::{SyncEngine, SyncPhase};
use crate::monitor::NetworkStatus;

/// What the loop decided to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Drain,
    Refresh,
    DrainAndRefresh,
}

impl Trigger {
    fn drains(self) -> bool {
        matches!(self, Trigger::Drain | Trigger::DrainAndRefresh)
    }

    fn refreshes(self) -> bool {
        matches!(self, Trigger::Refresh | Trigger::DrainAndRefresh)
    }
}

/// Drives the engine from network, push and timer signals
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    network_rx: watch::Receiver<NetworkStatus>,
    notices: Option<mpsc::Receiver<ChangeNotice>>,
}

impl SyncScheduler {
    /// Creates a scheduler; `notices` is `None` when live updates are off
    pub fn new(engine: Arc<SyncEngine>, notices: Option<mpsc::Receiver<ChangeNotice>>) -> Self {
        let network_rx = engine.monitor().subscribe();
        Self {
            engine,
            network_rx,
            notices,
        }
    }

    /// Main loop; returns when cancelled
    ///
    /// Starts with a drain and a refresh so that actions restored from disk
    /// are delivered without waiting for a signal.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Sync scheduler starting");
        self.handle(Trigger::DrainAndRefresh).await;
        let mut was_usable = self.network_rx.borrow_and_update().usable;

        loop {
            let retry_at = self.engine.next_retry_at();

            tokio::select! {
                _ = cancel.cancelled() => break,

                _ = self.engine.woken() => {
                    if self.engine.phase() != SyncPhase::Backoff {
                        self.handle(Trigger::Drain).await;
                    }
                }

                _ = tokio::time::sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                    debug!("Retry timer fired");
                    self.handle(Trigger::Drain).await;
                }

                changed = self.network_rx.changed() => {
                    if changed.is_err() {
                        warn!("Network monitor dropped, scheduler stopping");
                        break;
                    }
                    let usable = self.network_rx.borrow_and_update().usable;
                    if usable && !was_usable {
                        info!("Backend usable again");
                        self.handle(Trigger::DrainAndRefresh).await;
                    }
                    was_usable = usable;
                }

                notice = next_notice(&mut self.notices) => match notice {
                    Some(notice) if notice.is_update() => self.handle(Trigger::Refresh).await,
                    Some(_) => {}
                    None => {
                        debug!("Live-update channel closed");
                        self.notices = None;
                    }
                },
            }
        }

        info!("Sync scheduler stopped");
    }

    async fn handle(&self, trigger: Trigger) {
        debug!(?trigger, "Handling trigger");
        let mut refreshed = false;

        if trigger.drains() {
            match self.engine.drain().await {
                Ok(report) => refreshed = report.snapshot_refreshed,
                Err(e) => error!(error = %e, "Drain failed"),
            }
        }

        if trigger.refreshes() && !refreshed {
            if let Err(e) = self.engine.refresh_snapshot().await {
                warn!(error = %e, "Snapshot refresh failed");
            }
        }
    }
}

async fn next_notice(rx: &mut Option<mpsc::Receiver<ChangeNotice>>) -> Option<ChangeNotice> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
