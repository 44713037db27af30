//! Config command - view and validate the configuration
//!
//! `show` prints the effective configuration (file values merged over
//! defaults). `validate` reports every problem instead of stopping at the
//! first one.

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use super::ConfigSource;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, format: OutputFormat, source: &ConfigSource) -> Result<()> {
        match self {
            ConfigCommand::Show => show(format, source),
            ConfigCommand::Validate => validate(format, source),
        }
    }
}

fn show(format: OutputFormat, source: &ConfigSource) -> Result<()> {
    let formatter = get_formatter(format);
    let config = source.read()?;

    info!(config_path = %source.path.display(), "Showing configuration");

    if format.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        let origin = if source.path.exists() {
            source.path.display().to_string()
        } else {
            "built-in defaults".to_string()
        };
        formatter.success(&format!("Configuration ({origin})"));
        formatter.info("");
        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }
    Ok(())
}

fn validate(format: OutputFormat, source: &ConfigSource) -> Result<()> {
    let formatter = get_formatter(format);
    let path = source.path.display().to_string();

    if !source.path.exists() {
        if format.is_json() {
            let errors: Vec<&str> = if source.explicit {
                vec!["Configuration file not found"]
            } else {
                Vec::new()
            };
            formatter.print_json(&serde_json::json!({
                "valid": !source.explicit,
                "config_path": path,
                "errors": errors,
            }));
        } else if source.explicit {
            formatter.error(&format!("Configuration file not found at {path}"));
        } else {
            formatter.info(&format!("Configuration file not found at {path}"));
            formatter.info("Built-in defaults are in use.");
        }
        return Ok(());
    }

    let config = match source.read() {
        Ok(config) => config,
        Err(e) => {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": path,
                    "errors": [format!("{e:#}")],
                }));
            } else {
                formatter.error(&format!("{e:#}"));
            }
            return Ok(());
        }
    };

    let errors = config.validate();
    if format.is_json() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": path,
            "errors": messages,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {path}"));
    } else {
        formatter.error(&format!("Configuration has {} error(s):", errors.len()));
        for error in &errors {
            formatter.info(&format!("  {error}"));
        }
    }
    Ok(())
}
