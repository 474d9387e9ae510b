use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use importer::sources::roc::DEFAULT_BASE_URL;
use storage::services::dedup::DEFAULT_DEDUP_WINDOW_MS;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub backup_dir: PathBuf,
    pub dedup_window_ms: i64,
    pub roc_base_url: String,
    pub bridge_poll_interval: Duration,
    pub hub_client_buffer: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            backup_dir: std::env::var("BACKUP_DIR")
                .unwrap_or_else(|_| "./backups".to_string())
                .into(),
            dedup_window_ms: parse_or("DEDUP_WINDOW_MS", DEFAULT_DEDUP_WINDOW_MS)?,
            roc_base_url: std::env::var("ROC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            bridge_poll_interval: Duration::from_secs(parse_or("BRIDGE_POLL_INTERVAL_SECS", 5)?),
            hub_client_buffer: parse_or("HUB_CLIENT_BUFFER", 64)?,
        })
    }
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be a number")),
        Err(_) => Ok(default),
    }
}
