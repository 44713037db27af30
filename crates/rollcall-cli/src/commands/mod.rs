//! CLI commands
//!
//! Commands that touch kiosk state open a [`Kiosk`], which wires the local
//! database, the server client and the sync engine together from the
//! configuration. Commands that only read the configuration use
//! [`ConfigSource`] directly.

pub mod actions;
pub mod config;
pub mod dead_letters;
pub mod queue;
pub mod run;
pub mod status;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use rollcall_cache::{DatabasePool, SqliteKeyValueStore};
use rollcall_core::config::Config;
use rollcall_core::ports::SystemClock;
use rollcall_remote::{HttpAttendanceService, KioskClient, ServerRoutes};
use rollcall_sync::identity::load_client_id;
use rollcall_sync::{EngineSettings, NetworkMonitor, SyncEngine};

/// Where the configuration comes from
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// Given with `--config`; a missing file is then an error
    pub explicit: bool,
}

impl ConfigSource {
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some(path) => Self {
                path: PathBuf::from(path),
                explicit: true,
            },
            None => Self {
                path: Config::default_path(),
                explicit: false,
            },
        }
    }

    /// Parses the file, or returns defaults when the default path is absent
    pub fn read(&self) -> Result<Config> {
        if !self.explicit && !self.path.exists() {
            debug!(path = %self.path.display(), "No configuration file, using defaults");
            return Ok(Config::default());
        }
        Config::load(&self.path)
            .with_context(|| format!("Failed to load configuration {}", self.path.display()))
    }

    /// Parses and validates the configuration
    pub fn load(&self) -> Result<Config> {
        let config = self.read()?;
        let errors = config.validate();
        if !errors.is_empty() {
            let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
            bail!(
                "Invalid configuration {}: {}",
                self.path.display(),
                details.join("; ")
            );
        }
        Ok(config)
    }
}

/// An opened kiosk: storage, server adapter, monitor and engine
pub struct Kiosk {
    pub config: Config,
    pub pool: DatabasePool,
    pub client: Arc<KioskClient>,
    pub monitor: Arc<NetworkMonitor>,
    pub engine: Arc<SyncEngine>,
}

impl Kiosk {
    /// Opens the local database and restores the engine from it
    pub async fn open(source: &ConfigSource) -> Result<Self> {
        let config = source.load()?;

        let db_path = &config.storage.database;
        let pool = DatabasePool::new(db_path)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        let store = Arc::new(SqliteKeyValueStore::new(pool.pool().clone()));

        let client_id = load_client_id(&*store, config.server.client_id.as_deref())
            .await
            .context("Failed to load client id")?;

        let client = Arc::new(
            KioskClient::new(
                &config.server.base_url,
                client_id,
                config.server.request_timeout(),
            )
            .context("Failed to create server client")?
            .with_routes(ServerRoutes::from_config(&config.server)),
        );
        let service = Arc::new(HttpAttendanceService::new(
            client.clone(),
            config.monitor.probe_timeout(),
        ));
        let monitor = Arc::new(NetworkMonitor::from_config(service.clone(), &config));

        let engine = SyncEngine::open(
            service,
            monitor.clone(),
            store,
            Arc::new(SystemClock),
            EngineSettings::from_config(&config),
        )
        .await
        .context("Failed to open sync engine")?;

        info!(
            client_id = %client_id,
            server = %config.server.base_url,
            database = %db_path.display(),
            "Kiosk opened"
        );

        Ok(Self {
            config,
            pool,
            client,
            monitor,
            engine: Arc::new(engine),
        })
    }

    /// Flushes and closes the database
    pub async fn close(self) {
        self.pool.close().await;
    }
}
