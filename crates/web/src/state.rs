use std::sync::Arc;

use dashmap::DashMap;
use importer::Bridge;
use storage::Database;
use storage::services::{BackupService, IngestSettings, RaceControl};

use crate::config::Config;
use crate::hub::Hub;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub hub: Hub,
    /// One external bridge per event, created on first use.
    pub bridges: Arc<DashMap<i64, Arc<Bridge>>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db,
            hub: Hub::new(config.hub_client_buffer),
            bridges: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            dedup_window_ms: self.config.dedup_window_ms,
        }
    }

    pub fn race_control(&self) -> RaceControl<'_> {
        RaceControl::new(&self.db, self.ingest_settings())
    }

    pub fn backups(&self) -> BackupService<'_> {
        BackupService::new(&self.db, self.config.backup_dir.clone())
    }
}

#[cfg(test)]
pub(crate) async fn test_state(backup_dir: &std::path::Path) -> AppState {
    use std::time::Duration;

    let db = Database::in_memory().await.unwrap();
    AppState::new(
        db,
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            backup_dir: backup_dir.to_path_buf(),
            dedup_window_ms: 5_000,
            roc_base_url: "http://127.0.0.1:9".to_string(),
            bridge_poll_interval: Duration::from_secs(3600),
            hub_client_buffer: 16,
        },
    )
}
