//! Sync command - deliver queued actions now
//!
//! Probes the server once, runs a single drain cycle and prints the drain
//! report. A cycle that stops on a transient failure leaves the remaining
//! actions queued; they are not retried by this command.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use rollcall_sync::engine::SkipReason;
use rollcall_sync::DrainReport;

use super::{ConfigSource, Kiosk};
use crate::output::{get_formatter, plural, print_serialized, OutputFormat, OutputFormatter};

/// Run one drain cycle
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Skip the health probe and attempt delivery immediately
    #[arg(long)]
    pub no_probe: bool,
}

impl SyncCommand {
    pub async fn execute(&self, format: OutputFormat, source: &ConfigSource) -> Result<()> {
        let formatter = get_formatter(format);
        let kiosk = Kiosk::open(source).await?;

        if !self.no_probe {
            let status = kiosk.monitor.probe_once().await;
            info!(network = %status.state, usable = status.usable, "Probed server");
        }

        let report = kiosk.engine.drain().await.context("Drain failed")?;

        if format.is_json() {
            print_serialized(&*formatter, &report)?;
        } else {
            display_report(&*formatter, &report);
        }

        kiosk.close().await;
        Ok(())
    }
}

fn display_report(formatter: &dyn OutputFormatter, report: &DrainReport) {
    match report.skipped {
        Some(SkipReason::NotUsable) => {
            formatter.warn("Server not reachable; nothing was sent");
            formatter.info(&format!("{} still queued", plural(report.remaining, "action")));
            return;
        }
        Some(SkipReason::InFlight) => {
            formatter.warn("Another drain is already running");
            return;
        }
        None => {}
    }

    if !report.changed() && report.stopped.is_none() {
        formatter.success("Queue is empty, nothing to deliver");
        return;
    }

    if report.stopped.is_some() {
        formatter.warn("Delivery stopped early");
    } else {
        formatter.success("Queue drained");
    }

    if report.applied > 0 {
        formatter.info(&format!("Applied:         {}", report.applied));
    }
    if report.already_applied > 0 {
        formatter.info(&format!("Already applied: {}", report.already_applied));
    }
    if report.dead_lettered > 0 {
        formatter.info(&format!("Dead-lettered:   {}", report.dead_lettered));
    }
    if report.remapped > 0 {
        formatter.info(&format!("Remapped:        {}", report.remapped));
    }
    formatter.info(&format!("Remaining:       {}", report.remaining));
    if let Some(reason) = &report.stopped {
        formatter.info(&format!("Stopped by:      {reason}"));
    }
    if report.dead_lettered > 0 {
        formatter.info("Run 'rollcall dead-letters list' to review rejected actions.");
    }
}
