//! Status command - engine and network state at a glance

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use rollcall_sync::EngineStatus;

use super::{ConfigSource, Kiosk};
use crate::output::{format_time, get_formatter, print_serialized, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Report the last known network state without probing the server
    #[arg(long)]
    pub offline: bool,
}

impl StatusCommand {
    pub async fn execute(&self, format: OutputFormat, source: &ConfigSource) -> Result<()> {
        let formatter = get_formatter(format);
        let kiosk = Kiosk::open(source).await?;

        if !self.offline {
            kiosk.monitor.probe_once().await;
        }
        let status = kiosk.engine.status().await;

        if format.is_json() {
            let mut json = serde_json::to_value(&status)?;
            json["client_id"] = serde_json::json!(kiosk.client.client_id());
            json["server"] = serde_json::json!(kiosk.config.server.base_url);
            print_serialized(&*formatter, &json)?;
        } else {
            formatter.success(&format!("Rollcall kiosk - {}", kiosk.config.server.base_url));
            formatter.info(&format!("Client id:     {}", kiosk.client.client_id()));
            display_status(&*formatter, &status);
        }

        kiosk.close().await;
        Ok(())
    }
}

fn display_status(formatter: &dyn OutputFormatter, status: &EngineStatus) {
    let usable = if status.network.usable {
        "usable"
    } else {
        "not usable"
    };
    formatter.info(&format!("Network:       {} ({usable})", status.network.state));
    formatter.info(&format!("Phase:         {}", status.phase));
    formatter.info(&format!("Pending:       {}", status.pending));
    formatter.info(&format!("Dead letters:  {}", status.dead_letters));
    formatter.info(&format!(
        "Last drain:    {}",
        format_time(status.last_drain_at, "never")
    ));

    let age = status
        .snapshot_fetched_at
        .map(|at| format!(" ({}s old)", (Utc::now() - at).num_seconds().max(0)))
        .unwrap_or_default();
    formatter.info(&format!(
        "Snapshot:      revision {}{age}",
        status.snapshot_revision
    ));

    if let Some(ms) = status.retry_in_ms {
        formatter.info(&format!("Next retry:    in {:.1}s", ms as f64 / 1000.0));
    }
    if let Some(error) = &status.last_error {
        match status.last_error_kind {
            Some(kind) => formatter.warn(&format!("Last error ({kind}): {error}")),
            None => formatter.warn(&format!("Last error: {error}")),
        }
    }
    if status.dead_letters > 0 {
        formatter.info("Run 'rollcall dead-letters list' to review rejected actions.");
    }
}
