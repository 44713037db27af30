//! Network and health monitor
//!
//! The [`NetworkMonitor`] combines two independent signals:
//!
//! - the platform link signal ("is there a network at all"), and
//! - a periodic, time-bounded probe of the attendance server.
//!
//! On a local-network kiosk the link can be up while the backend is down,
//! and the link signal can claim "offline" while the LAN server answers.
//! The derived [`NetworkStatus`] is published on a watch channel; the
//! scheduler reacts to transitions into the usable state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use rollcall_core::config::Config;
use rollcall_core::ports::{IHealthProbe, RemoteError};

/// Connectivity as shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkState {
    /// Link up and the server answers
    Online,
    /// Link up but the server does not answer
    Unreachable,
    /// The platform reports no link
    Offline,
}

impl std::fmt::Display for NetworkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NetworkState::Online => "online",
            NetworkState::Unreachable => "unreachable",
            NetworkState::Offline => "offline",
        };
        f.write_str(name)
    }
}

/// Published monitor output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkStatus {
    pub state: NetworkState,
    /// Whether drains and direct submissions may run
    pub usable: bool,
}

#[derive(Debug, Clone, Copy)]
struct Signals {
    link_up: bool,
    /// `None` until the first probe or call result
    backend_reachable: Option<bool>,
}

impl Signals {
    fn status(&self, local_trusted: bool) -> NetworkStatus {
        match (self.link_up, self.backend_reachable) {
            (true, Some(false)) => NetworkStatus {
                state: NetworkState::Unreachable,
                usable: false,
            },
            (true, _) => NetworkStatus {
                state: NetworkState::Online,
                usable: true,
            },
            (false, reachable) => NetworkStatus {
                state: NetworkState::Offline,
                usable: local_trusted && reachable == Some(true),
            },
        }
    }
}

/// Tracks link and backend reachability
pub struct NetworkMonitor {
    probe: Arc<dyn IHealthProbe>,
    probe_interval: Duration,
    probe_timeout: Duration,
    local_trusted: bool,
    signals: Mutex<Signals>,
    status_tx: watch::Sender<NetworkStatus>,
}

impl NetworkMonitor {
    /// Creates a monitor that assumes the link is up and the backend unknown
    pub fn new(
        probe: Arc<dyn IHealthProbe>,
        probe_interval: Duration,
        probe_timeout: Duration,
        local_trusted: bool,
    ) -> Self {
        let signals = Signals {
            link_up: true,
            backend_reachable: None,
        };
        let (status_tx, _) = watch::channel(signals.status(local_trusted));
        Self {
            probe,
            probe_interval,
            probe_timeout,
            local_trusted,
            signals: Mutex::new(signals),
            status_tx,
        }
    }

    pub fn from_config(probe: Arc<dyn IHealthProbe>, config: &Config) -> Self {
        Self::new(
            probe,
            config.monitor.probe_interval(),
            config.monitor.probe_timeout(),
            config.sync.local_trusted,
        )
    }

    pub fn status(&self) -> NetworkStatus {
        *self.status_tx.borrow()
    }

    pub fn state(&self) -> NetworkState {
        self.status().state
    }

    pub fn is_usable(&self) -> bool {
        self.status().usable
    }

    /// Subscribes to status changes
    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status_tx.subscribe()
    }

    /// Feeds the platform link signal
    pub fn set_link_up(&self, up: bool) {
        self.update(|s| s.link_up = up);
    }

    /// Records that the server answered a call
    pub fn report_reachable(&self) {
        self.update(|s| s.backend_reachable = Some(true));
    }

    /// Records that a call to the server failed at the network level
    pub fn report_unreachable(&self, reason: &str) {
        debug!(reason, "Backend reported unreachable");
        self.update(|s| s.backend_reachable = Some(false));
    }

    fn update(&self, apply: impl FnOnce(&mut Signals)) -> NetworkStatus {
        let mut signals = self.signals.lock().unwrap_or_else(|e| e.into_inner());
        apply(&mut signals);
        let next = signals.status(self.local_trusted);
        drop(signals);

        let changed = self.status_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            info!(state = %next.state, usable = next.usable, "Network status changed");
        }
        next
    }

    /// Probes the server once, bounded by the probe timeout
    pub async fn probe_once(&self) -> NetworkStatus {
        let result = match tokio::time::timeout(self.probe_timeout, self.probe.probe()).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout),
        };
        match result {
            Ok(()) => self.update(|s| s.backend_reachable = Some(true)),
            Err(e) => {
                debug!(error = %e, "Health probe failed");
                self.update(|s| s.backend_reachable = Some(false))
            }
        }
    }

    /// Probes on a fixed interval until cancelled
    ///
    /// The first probe runs immediately.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(interval_secs = self.probe_interval.as_secs(), "Network monitor starting");
        let mut ticker = tokio::time::interval(self.probe_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let status = self.probe_once().await;
                    if !status.usable {
                        warn!(state = %status.state, "Backend not usable");
                    }
                }
            }
        }
        info!("Network monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    struct StubProbe {
        up: AtomicBool,
        hang: bool,
    }

    #[async_trait::async_trait]
    impl IHealthProbe for StubProbe {
        async fn probe(&self) -> Result<(), RemoteError> {
            if self.hang {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.up.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(RemoteError::Connect("refused".into()))
            }
        }
    }

    fn monitor(up: bool, local_trusted: bool) -> (Arc<StubProbe>, NetworkMonitor) {
        let probe = Arc::new(StubProbe {
            up: AtomicBool::new(up),
            hang: false,
        });
        let monitor = NetworkMonitor::new(
            probe.clone(),
            Duration::from_secs(15),
            Duration::from_secs(3),
            local_trusted,
        );
        (probe, monitor)
    }

    #[test]
    fn test_signal_table() {
        let status = |link_up, backend_reachable, trusted| {
            Signals {
                link_up,
                backend_reachable,
            }
            .status(trusted)
        };
        assert_eq!(status(true, None, false).state, NetworkState::Online);
        assert!(status(true, Some(true), false).usable);
        assert_eq!(status(true, Some(false), false).state, NetworkState::Unreachable);
        assert!(!status(false, Some(true), false).usable);
        assert!(status(false, Some(true), true).usable);
        assert_eq!(status(false, Some(true), true).state, NetworkState::Offline);
        assert!(!status(false, None, true).usable);
    }

    #[tokio::test]
    async fn test_probe_transitions_are_published() {
        let (probe, monitor) = monitor(false, false);
        let mut rx = monitor.subscribe();

        assert_eq!(monitor.probe_once().await.state, NetworkState::Unreachable);
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        probe.up.store(true, Ordering::SeqCst);
        assert!(monitor.probe_once().await.usable);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, NetworkState::Online);

        // Same status again: no notification.
        monitor.probe_once().await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_link_down_gates_unless_trusted() {
        let (_probe, strict) = monitor(true, false);
        strict.probe_once().await;
        strict.set_link_up(false);
        assert_eq!(strict.state(), NetworkState::Offline);
        assert!(!strict.is_usable());

        let (_probe, trusted) = monitor(true, true);
        trusted.probe_once().await;
        trusted.set_link_up(false);
        assert!(trusted.is_usable());
    }

    #[tokio::test]
    async fn test_reported_call_results() {
        let (_probe, monitor) = monitor(true, false);
        monitor.report_unreachable("timeout");
        assert_eq!(monitor.state(), NetworkState::Unreachable);
        monitor.report_reachable();
        assert_eq!(monitor.state(), NetworkState::Online);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_probe_times_out() {
        let probe = Arc::new(StubProbe {
            up: AtomicBool::new(true),
            hang: true,
        });
        let monitor = NetworkMonitor::new(
            probe,
            Duration::from_secs(15),
            Duration::from_secs(3),
            false,
        );

        let status = monitor.probe_once().await;
        assert_eq!(status.state, NetworkState::Unreachable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel() {
        let (_probe, monitor) = monitor(true, false);
        let monitor = Arc::new(monitor);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(monitor.clone().run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(monitor.state(), NetworkState::Online);
        cancel.cancel();
        handle.await.unwrap();
    }
}
