//! Dead-letters command - review and acknowledge rejected actions
//!
//! Actions the server refused during replay are kept until an operator
//! acknowledges them. Acknowledging removes the entry; it does not resend.

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use rollcall_core::domain::TempId;

use super::queue::describe_pending;
use super::{ConfigSource, Kiosk};
use crate::output::{format_time, get_formatter, plural, print_serialized, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum DeadLettersCommand {
    /// List rejected actions
    List,
    /// Acknowledge (and remove) a rejected action
    Ack {
        /// Action id as shown by `list` (tmp-...)
        id: TempId,
    },
}

impl DeadLettersCommand {
    pub async fn execute(&self, format: OutputFormat, source: &ConfigSource) -> Result<()> {
        let kiosk = Kiosk::open(source).await?;
        let result = match self {
            DeadLettersCommand::List => list(&kiosk, format).await,
            DeadLettersCommand::Ack { id } => acknowledge(&kiosk, *id, format).await,
        };
        kiosk.close().await;
        result
    }
}

async fn list(kiosk: &Kiosk, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let letters = kiosk.engine.dead_letters().await;

    if format.is_json() {
        return print_serialized(&*formatter, &letters);
    }
    if letters.is_empty() {
        formatter.success("No rejected actions");
        return Ok(());
    }

    formatter.warn(&format!("{} rejected by the server", plural(letters.len(), "action")));
    for letter in &letters {
        formatter.info("");
        formatter.info(&describe_pending(&letter.action));
        formatter.info(&format!("    status {}: {}", letter.status, letter.reason));
        formatter.info(&format!(
            "    rejected {}",
            format_time(Some(letter.failed_at), "-")
        ));
    }
    formatter.info("");
    formatter.info("Acknowledge with 'rollcall dead-letters ack <id>'.");
    Ok(())
}

async fn acknowledge(kiosk: &Kiosk, id: TempId, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let letter = kiosk
        .engine
        .acknowledge_dead_letter(id)
        .await
        .with_context(|| format!("Failed to acknowledge {id}"))?;

    info!(action_id = %id, "Dead letter acknowledged");
    if format.is_json() {
        print_serialized(&*formatter, &letter)
    } else {
        formatter.success(&format!("Acknowledged {id}"));
        formatter.info(&describe_pending(&letter.action));
        Ok(())
    }
}
