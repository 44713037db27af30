//! Queue and view commands
//!
//! `queue` lists actions waiting for delivery, oldest first. `view` prints
//! the attendance list as the kiosk screen shows it: the last snapshot with
//! queued actions applied on top.

use anyhow::Result;
use clap::Args;

use rollcall_core::domain::{Action, AttendanceRecord, PendingAction, Snapshot};

use super::{ConfigSource, Kiosk};
use crate::output::{format_time, get_formatter, plural, print_serialized, OutputFormat};

/// List pending actions
#[derive(Debug, Args)]
pub struct QueueCommand {}

impl QueueCommand {
    pub async fn execute(&self, format: OutputFormat, source: &ConfigSource) -> Result<()> {
        let formatter = get_formatter(format);
        let kiosk = Kiosk::open(source).await?;
        let pending = kiosk.engine.pending_actions().await;

        if format.is_json() {
            print_serialized(&*formatter, &pending)?;
        } else if pending.is_empty() {
            formatter.success("No pending actions");
        } else {
            formatter.success(&format!("{} pending", plural(pending.len(), "action")));
            formatter.info("");
            for action in &pending {
                formatter.info(&describe_pending(action));
                if let Some(error) = &action.last_error {
                    formatter.info(&format!(
                        "    {} attempt(s), last error: {error}",
                        action.retry_count
                    ));
                }
            }
        }

        kiosk.close().await;
        Ok(())
    }
}

pub(crate) fn describe_pending(pending: &PendingAction) -> String {
    let detail = match &pending.action {
        Action::CheckIn {
            subject,
            seat,
            entry_time,
        } => format!(
            "check-in   {subject} seat {seat} at {}",
            entry_time.format("%H:%M:%S")
        ),
        Action::CheckOut {
            subject,
            target,
            exit_time,
        } => {
            let target = target.map(|t| format!(" record {t}")).unwrap_or_default();
            format!(
                "check-out  {subject}{target} at {}",
                exit_time.format("%H:%M:%S")
            )
        }
        Action::Toggle { subject, at } => {
            format!("toggle     {subject} at {}", at.format("%H:%M:%S"))
        }
    };
    format!("{}  {detail}", pending.id)
}

/// Print the attendance list with pending actions applied
#[derive(Debug, Args)]
pub struct ViewCommand {
    /// Only show subjects still present
    #[arg(long)]
    pub open: bool,
}

impl ViewCommand {
    pub async fn execute(&self, format: OutputFormat, source: &ConfigSource) -> Result<()> {
        let formatter = get_formatter(format);
        let kiosk = Kiosk::open(source).await?;

        let snapshot = kiosk.engine.snapshot().await;
        let records: Vec<AttendanceRecord> = kiosk
            .engine
            .rendered_records()
            .await
            .into_iter()
            .filter(|r| !self.open || r.is_open())
            .collect();

        if format.is_json() {
            print_serialized(&*formatter, &records)?;
        } else {
            formatter.success(&format!(
                "{} (snapshot revision {}, fetched {})",
                plural(records.len(), "record"),
                snapshot.revision,
                format_time(snapshot.fetched_at, "never")
            ));
            formatter.info("");
            formatter.info("Record               Subject  Name                 Seat  In        Out");
            for record in &records {
                formatter.info(&render_row(&snapshot, record));
            }
        }

        kiosk.close().await;
        Ok(())
    }
}

fn render_row(snapshot: &Snapshot, record: &AttendanceRecord) -> String {
    let record_id = if record.pending {
        format!("{}*", record.record_id)
    } else {
        record.record_id.to_string()
    };
    let name = snapshot.name_of(&record.subject).unwrap_or("-");
    let seat = record
        .seat
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    let exit = record
        .exit_time
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<20} {:<8} {:<20} {:<5} {:<9} {}",
        truncate(&record_id, 20),
        record.subject,
        truncate(name, 20),
        seat,
        record.entry_time.format("%H:%M:%S"),
        exit
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rollcall_core::domain::{RecordId, RecordRef, Seat, SubjectRef};

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("山田太郎山田太郎", 6), "山田太...");
    }

    #[test]
    fn test_pending_description() {
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 8, 30, 0).unwrap();
        let pending = PendingAction::new(
            Action::CheckOut {
                subject: SubjectRef::new("1010001").unwrap(),
                target: Some(RecordRef::Server(RecordId::new(789))),
                exit_time: at,
            },
            at,
        );
        let line = describe_pending(&pending);
        assert!(line.starts_with(&pending.id.to_string()));
        assert!(line.contains("check-out  1010001 record 789 at 08:30:00"), "{line}");
    }

    #[test]
    fn test_pending_rows_are_marked() {
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 8, 30, 0).unwrap();
        let record = AttendanceRecord {
            record_id: RecordRef::Server(RecordId::new(5)),
            subject: SubjectRef::new("1010001").unwrap(),
            seat: Some(Seat::new("12").unwrap()),
            entry_time: at,
            exit_time: None,
            pending: true,
        };
        let row = render_row(&Snapshot::default(), &record);
        assert!(row.starts_with("5*"), "{row}");
        assert!(row.contains("08:30:00"));
    }
}
