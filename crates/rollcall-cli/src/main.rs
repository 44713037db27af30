//! Rollcall CLI - kiosk agent and operator commands
//!
//! Provides commands for:
//! - Running the kiosk agent (scanner input, background sync)
//! - One-shot check-in, check-out and scan submissions
//! - Inspecting the queue, the rendered attendance list and engine status
//! - Reviewing and acknowledging rejected actions
//! - Viewing and validating configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    actions::{CheckInCommand, CheckOutCommand, ScanCommand},
    config::ConfigCommand,
    dead_letters::DeadLettersCommand,
    queue::{QueueCommand, ViewCommand},
    run::RunCommand,
    status::StatusCommand,
    sync::SyncCommand,
    ConfigSource,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "rollcall",
    version,
    about = "Offline-resilient attendance kiosk client"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the kiosk agent
    Run(RunCommand),
    /// Check a subject in
    CheckIn(CheckInCommand),
    /// Check a subject out
    CheckOut(CheckOutCommand),
    /// Submit one scanner read
    Scan(ScanCommand),
    /// Deliver queued actions now
    Sync(SyncCommand),
    /// Show engine and network status
    Status(StatusCommand),
    /// List actions waiting for delivery
    Queue(QueueCommand),
    /// Show the attendance list including pending actions
    View(ViewCommand),
    /// Review actions the server rejected
    #[command(subcommand)]
    DeadLetters(DeadLettersCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Installs the tracing subscriber
///
/// `RUST_LOG` wins; otherwise `-v` flags raise the configured level.
/// Logs go to stderr so command output on stdout stays parseable.
fn init_tracing(verbose: u8, level: &str, json: bool) {
    let default = match verbose {
        0 => level,
        1 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let source = ConfigSource::from_arg(cli.config.as_deref());

    // A broken file is reported by the command itself; logging falls back
    // to defaults until then.
    let logging = source.read().map(|c| c.logging).unwrap_or_default();
    init_tracing(cli.verbose, &logging.level, logging.format == "json");

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let result = match &cli.command {
        Commands::Run(cmd) => cmd.execute(format, &source).await,
        Commands::CheckIn(cmd) => cmd.execute(format, &source).await,
        Commands::CheckOut(cmd) => cmd.execute(format, &source).await,
        Commands::Scan(cmd) => cmd.execute(format, &source).await,
        Commands::Sync(cmd) => cmd.execute(format, &source).await,
        Commands::Status(cmd) => cmd.execute(format, &source).await,
        Commands::Queue(cmd) => cmd.execute(format, &source).await,
        Commands::View(cmd) => cmd.execute(format, &source).await,
        Commands::DeadLetters(cmd) => cmd.execute(format, &source).await,
        Commands::Config(cmd) => cmd.execute(format, &source).await,
    };

    if let Err(e) = &result {
        get_formatter(format).error(&format!("{e:#}"));
        std::process::exit(1);
    }
    Ok(())
}
