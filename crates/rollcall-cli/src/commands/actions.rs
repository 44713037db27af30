//! Check-in, check-out and scan commands
//!
//! One-shot submissions. The action is sent directly when the server is
//! usable and nothing is queued ahead of it; otherwise it is queued and
//! delivered by the next `rollcall sync` or the running agent.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use rollcall_core::domain::{RecordRef, Seat, SubjectRef};
use rollcall_sync::{ScanOutcome, SubmitOutcome};

use super::{ConfigSource, Kiosk};
use crate::output::{get_formatter, print_serialized, OutputFormat, OutputFormatter};

/// Record that a subject has arrived
#[derive(Debug, Args)]
pub struct CheckInCommand {
    /// Subject (student) id
    #[arg(long)]
    pub subject: SubjectRef,

    /// Seat label
    #[arg(long)]
    pub seat: Seat,
}

impl CheckInCommand {
    pub async fn execute(&self, format: OutputFormat, source: &ConfigSource) -> Result<()> {
        let formatter = get_formatter(format);
        let kiosk = Kiosk::open(source).await?;

        info!(subject = %self.subject, seat = %self.seat, "Submitting check-in");
        let outcome = kiosk
            .engine
            .check_in(self.subject.clone(), self.seat.clone())
            .await
            .context("Check-in failed")?;

        report_submission(&*formatter, format, &self.subject, &outcome)?;
        kiosk.close().await;
        Ok(())
    }
}

/// Record that a subject has left
#[derive(Debug, Args)]
pub struct CheckOutCommand {
    /// Subject (student) id
    #[arg(long)]
    pub subject: SubjectRef,

    /// Record to close: a server id, or a `tmp-` id of a queued check-in
    #[arg(long)]
    pub record: Option<RecordRef>,
}

impl CheckOutCommand {
    pub async fn execute(&self, format: OutputFormat, source: &ConfigSource) -> Result<()> {
        let formatter = get_formatter(format);
        let kiosk = Kiosk::open(source).await?;

        info!(subject = %self.subject, record = ?self.record, "Submitting check-out");
        let outcome = kiosk
            .engine
            .check_out(self.subject.clone(), self.record)
            .await
            .context("Check-out failed")?;

        report_submission(&*formatter, format, &self.subject, &outcome)?;
        kiosk.close().await;
        Ok(())
    }
}

/// Submit one raw scanner read as a toggle
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Text as produced by the scanner
    pub raw: String,
}

impl ScanCommand {
    pub async fn execute(&self, format: OutputFormat, source: &ConfigSource) -> Result<()> {
        let formatter = get_formatter(format);
        let kiosk = Kiosk::open(source).await?;

        let outcome = kiosk
            .engine
            .submit_scan(&self.raw)
            .await
            .context("Scan failed")?;
        report_scan(&*formatter, format, &outcome)?;

        kiosk.close().await;
        Ok(())
    }
}

/// Prints the result of a scan; shared with the kiosk agent
pub fn report_scan(
    formatter: &dyn OutputFormatter,
    format: OutputFormat,
    outcome: &ScanOutcome,
) -> Result<()> {
    match outcome {
        ScanOutcome::Duplicate { subject } => {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "outcome": "duplicate",
                    "subject": subject,
                }));
            } else {
                formatter.info(&format!("{subject}: duplicate scan ignored"));
            }
            Ok(())
        }
        ScanOutcome::Submitted { subject, outcome } => {
            report_submission(formatter, format, subject, outcome)
        }
    }
}

fn report_submission(
    formatter: &dyn OutputFormatter,
    format: OutputFormat,
    subject: &SubjectRef,
    outcome: &SubmitOutcome,
) -> Result<()> {
    if format.is_json() {
        let mut json = serde_json::to_value(outcome).context("Failed to serialize outcome")?;
        json["subject"] = serde_json::json!(subject);
        return print_serialized(formatter, &json);
    }

    match outcome {
        SubmitOutcome::Applied {
            record_id,
            message,
            ..
        } => {
            let record = record_id.map(|id| format!(" (record {id})")).unwrap_or_default();
            formatter.success(&format!("{subject}: applied{record}"));
            if let Some(message) = message {
                formatter.info(message);
            }
        }
        SubmitOutcome::AlreadyApplied { message, .. } => {
            formatter.success(&format!("{subject}: already recorded by the server"));
            formatter.info(message);
        }
        SubmitOutcome::Rejected {
            status, message, ..
        } => {
            formatter.error(&format!("{subject}: rejected by the server ({status}): {message}"));
        }
        SubmitOutcome::Queued { action_id, reason } => {
            formatter.warn(&format!("{subject}: queued as {action_id}"));
            if let Some(reason) = reason {
                formatter.info(&format!("Server unavailable: {reason}"));
            }
        }
    }
    Ok(())
}
