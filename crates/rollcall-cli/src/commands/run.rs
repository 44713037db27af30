//! Run command - the kiosk agent
//!
//! Starts the long-lived tasks and feeds scanner input to the engine:
//!
//! 1. Network monitor (periodic health probe)
//! 2. Live-update channel, when enabled
//! 3. Sync scheduler (drains on recovery, retries, refreshes on updates)
//! 4. Scanner reader: one scan per stdin line, submitted as a toggle
//!
//! Ctrl+C or SIGTERM cancels every task; queued actions stay on disk and are
//! delivered on the next start.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use rollcall_remote::LiveUpdateChannel;
use rollcall_sync::{SyncEngine, SyncError, SyncScheduler};

use super::actions::report_scan;
use super::{ConfigSource, Kiosk};
use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Capacity of the live-update notice channel
const NOTICE_BUFFER: usize = 16;

#[derive(Debug, Args)]
pub struct RunCommand {
    /// Do not read scans from stdin (sync only)
    #[arg(long)]
    pub no_scanner: bool,
}

/// Counters for scanner input
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub submitted: u32,
    pub duplicates: u32,
    pub invalid: u32,
}

impl RunCommand {
    pub async fn execute(&self, format: OutputFormat, source: &ConfigSource) -> Result<()> {
        let formatter = get_formatter(format);
        let kiosk = Kiosk::open(source).await?;
        let cancel = CancellationToken::new();

        let signal_token = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal(signal_token).await;
        });

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(kiosk.monitor.clone().run(cancel.clone())));

        let notices = if kiosk.config.live_updates.enabled {
            let (tx, rx) = mpsc::channel(NOTICE_BUFFER);
            let channel = LiveUpdateChannel::new(
                kiosk.client.clone(),
                kiosk.config.live_updates.reconnect_initial(),
                kiosk.config.live_updates.reconnect_max(),
            );
            tasks.push(tokio::spawn(channel.run(tx, cancel.clone())));
            Some(rx)
        } else {
            info!("Live updates disabled");
            None
        };

        let scheduler = SyncScheduler::new(kiosk.engine.clone(), notices);
        tasks.push(tokio::spawn(scheduler.run(cancel.clone())));

        formatter.success(&format!(
            "Kiosk running against {} (Ctrl+C to stop)",
            kiosk.config.server.base_url
        ));

        if self.no_scanner {
            cancel.cancelled().await;
        } else {
            let stdin = BufReader::new(tokio::io::stdin());
            let stats = scan_lines(&kiosk.engine, stdin, &*formatter, format, &cancel).await;
            info!(
                submitted = stats.submitted,
                duplicates = stats.duplicates,
                invalid = stats.invalid,
                "Scanner input finished"
            );
            // Input may close before shutdown, e.g. when stdin is not a tty.
            cancel.cancelled().await;
        }

        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Background task failed");
            }
        }

        let pending = kiosk.engine.pending_actions().await.len();
        info!(pending, "Kiosk stopped");
        if pending > 0 {
            formatter.warn(&format!("{pending} action(s) still queued for the next start"));
        }
        kiosk.close().await;
        Ok(())
    }
}

/// Submits each non-empty line of `reader` as a scan until EOF or cancel
pub async fn scan_lines<R>(
    engine: &Arc<SyncEngine>,
    reader: R,
    formatter: &dyn OutputFormatter,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> ScanStats
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = ScanStats::default();
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Scanner read failed");
                break;
            }
        };
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }

        match engine.submit_scan(raw).await {
            Ok(outcome) => {
                if matches!(outcome, rollcall_sync::ScanOutcome::Duplicate { .. }) {
                    stats.duplicates += 1;
                } else {
                    stats.submitted += 1;
                }
                if let Err(e) = report_scan(formatter, format, &outcome) {
                    warn!(error = %e, "Failed to print scan result");
                }
            }
            Err(SyncError::Domain(e)) => {
                stats.invalid += 1;
                formatter.warn(&format!("Unreadable scan {raw:?}: {e}"));
            }
            Err(e) => {
                // The kiosk keeps accepting scans; the failed one is reported.
                error!(error = %e, "Scan could not be recorded");
                formatter.error(&format!("Scan {raw:?} was not recorded: {e}"));
            }
        }
    }

    stats
}

/// Waits for SIGINT or SIGTERM and cancels `token`
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }

    token.cancel();
}
