//! Configuration module for Rollcall.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Rollcall.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sync: SyncConfig,
    pub monitor: MonitorConfig,
    pub live_updates: LiveUpdatesConfig,
    pub scanner: ScannerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Attendance server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the attendance server, e.g. `http://192.168.1.10:5000`.
    pub base_url: String,
    /// Upper bound for a single request, in seconds.
    pub request_timeout_secs: u64,
    /// Fixed client identifier. When `None` one is generated and stored locally.
    pub client_id: Option<String>,
    /// Route probed for reachability; any 2xx counts.
    pub health_path: String,
    /// Route of the `text/event-stream` push channel.
    pub events_path: String,
}

/// Queue draining settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// First retry delay after a transient failure, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Cap for the exponential retry delay, in seconds.
    pub retry_max_delay_secs: u64,
    /// Drain when the link signal is down but the backend probe succeeds.
    pub local_trusted: bool,
}

/// Backend health probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between health probes.
    pub probe_interval_secs: u64,
    /// Upper bound for a single probe, in seconds.
    pub probe_timeout_secs: u64,
}

/// Server push (live updates) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveUpdatesConfig {
    pub enabled: bool,
    /// First reconnect delay after the stream drops, in milliseconds.
    pub reconnect_initial_ms: u64,
    /// Cap for the reconnect delay, in seconds.
    pub reconnect_max_secs: u64,
}

/// QR scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Repeated scans of one subject inside this window are ignored.
    pub duplicate_window_secs: u64,
}

/// Local persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database holding the queue, dead letters and last snapshot.
    pub database: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `pretty` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/rollcall/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("rollcall")
            .join("config.yaml")
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SyncConfig {
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_secs(self.retry_max_delay_secs)
    }
}

impl MonitorConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl LiveUpdatesConfig {
    pub fn reconnect_initial(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_ms)
    }

    pub fn reconnect_max(&self) -> Duration {
        Duration::from_secs(self.reconnect_max_secs)
    }
}

impl ScannerConfig {
    pub fn duplicate_window(&self) -> Duration {
        Duration::from_secs(self.duplicate_window_secs)
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 10,
            client_id: None,
            health_path: "/api/settings".to_string(),
            events_path: "/api/stream".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_base_delay_ms: 1000,
            retry_max_delay_secs: 60,
            local_trusted: false,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probe_interval_secs: 15,
            probe_timeout_secs: 3,
        }
    }
}

impl Default for LiveUpdatesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reconnect_initial_ms: 1000,
            reconnect_max_secs: 30,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            duplicate_window_secs: 5,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("rollcall")
                .join("rollcall.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"monitor.probe_interval_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["pretty", "json"];

fn positive(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError {
            field: field.into(),
            message: "must be greater than 0".into(),
        });
    }
}

fn route(errors: &mut Vec<ValidationError>, field: &str, path: &str) {
    if !path.starts_with('/') || path.contains(char::is_whitespace) {
        errors.push(ValidationError {
            field: field.into(),
            message: format!("must be an absolute path without spaces, got '{path}'"),
        });
    }
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- server ---
        match url::Url::parse(&self.server.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError {
                field: "server.base_url".into(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError {
                field: "server.base_url".into(),
                message: format!("invalid URL '{}': {e}", self.server.base_url),
            }),
        }
        positive(
            &mut errors,
            "server.request_timeout_secs",
            self.server.request_timeout_secs,
        );
        if let Some(client_id) = &self.server.client_id {
            if uuid::Uuid::parse_str(client_id).is_err() {
                errors.push(ValidationError {
                    field: "server.client_id".into(),
                    message: format!("not a UUID: '{client_id}'"),
                });
            }
        }
        route(&mut errors, "server.health_path", &self.server.health_path);
        route(&mut errors, "server.events_path", &self.server.events_path);

        // --- sync ---
        positive(
            &mut errors,
            "sync.retry_base_delay_ms",
            self.sync.retry_base_delay_ms,
        );
        positive(
            &mut errors,
            "sync.retry_max_delay_secs",
            self.sync.retry_max_delay_secs,
        );
        if self.sync.retry_base_delay() > self.sync.retry_max_delay() {
            errors.push(ValidationError {
                field: "sync.retry_base_delay_ms".into(),
                message: format!(
                    "retry_base_delay_ms ({}) must not exceed retry_max_delay_secs ({}s)",
                    self.sync.retry_base_delay_ms, self.sync.retry_max_delay_secs
                ),
            });
        }

        // --- monitor ---
        positive(
            &mut errors,
            "monitor.probe_interval_secs",
            self.monitor.probe_interval_secs,
        );
        positive(
            &mut errors,
            "monitor.probe_timeout_secs",
            self.monitor.probe_timeout_secs,
        );
        if self.monitor.probe_timeout_secs >= self.monitor.probe_interval_secs
            && self.monitor.probe_interval_secs > 0
        {
            errors.push(ValidationError {
                field: "monitor.probe_timeout_secs".into(),
                message: format!(
                    "probe_timeout_secs ({}) must be shorter than probe_interval_secs ({})",
                    self.monitor.probe_timeout_secs, self.monitor.probe_interval_secs
                ),
            });
        }

        // --- live_updates ---
        if self.live_updates.enabled {
            positive(
                &mut errors,
                "live_updates.reconnect_initial_ms",
                self.live_updates.reconnect_initial_ms,
            );
            positive(
                &mut errors,
                "live_updates.reconnect_max_secs",
                self.live_updates.reconnect_max_secs,
            );
        }

        // --- storage ---
        if self.storage.database.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.database".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use rollcall_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .server_base_url("http://10.0.0.5:5000")
///     .monitor_probe_interval_secs(30)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- server ---

    pub fn server_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.server.base_url = url.into();
        self
    }

    pub fn server_request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.server.request_timeout_secs = seconds;
        self
    }

    pub fn server_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.server.client_id = Some(client_id.into());
        self
    }

    pub fn server_health_path(mut self, path: impl Into<String>) -> Self {
        self.config.server.health_path = path.into();
        self
    }

    pub fn server_events_path(mut self, path: impl Into<String>) -> Self {
        self.config.server.events_path = path.into();
        self
    }

    // --- sync ---

    pub fn sync_retry_base_delay_ms(mut self, ms: u64) -> Self {
        self.config.sync.retry_base_delay_ms = ms;
        self
    }

    pub fn sync_retry_max_delay_secs(mut self, seconds: u64) -> Self {
        self.config.sync.retry_max_delay_secs = seconds;
        self
    }

    pub fn sync_local_trusted(mut self, trusted: bool) -> Self {
        self.config.sync.local_trusted = trusted;
        self
    }

    // --- monitor ---

    pub fn monitor_probe_interval_secs(mut self, seconds: u64) -> Self {
        self.config.monitor.probe_interval_secs = seconds;
        self
    }

    pub fn monitor_probe_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.monitor.probe_timeout_secs = seconds;
        self
    }

    // --- live_updates ---

    pub fn live_updates_enabled(mut self, enabled: bool) -> Self {
        self.config.live_updates.enabled = enabled;
        self
    }

    // --- scanner ---

    pub fn scanner_duplicate_window_secs(mut self, seconds: u64) -> Self {
        self.config.scanner.duplicate_window_secs = seconds;
        self
    }

    // --- storage ---

    pub fn storage_database(mut self, path: PathBuf) -> Self {
        self.config.storage.database = path;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
