//! Runtime configuration from the environment

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub run_migrations: bool,
    /// Directory served under `/media`
    pub media_dir: PathBuf,
    pub cache_warm_interval: Duration,
}

impl Config {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8000".to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:8000")?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            None => 5,
        };

        let run_migrations = match lookup("RUN_MIGRATIONS") {
            Some(v) => parse_bool(&v).context("RUN_MIGRATIONS must be true or false")?,
            None => true,
        };

        let warm_secs: u64 = match lookup("CACHE_WARM_INTERVAL_SECS") {
            Some(v) => v
                .parse()
                .context("CACHE_WARM_INTERVAL_SECS must be a number of seconds")?,
            None => 600,
        };
        anyhow::ensure!(warm_secs > 0, "CACHE_WARM_INTERVAL_SECS must be greater than zero");

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            run_migrations,
            media_dir: lookup("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("media")),
            cache_warm_interval: Duration::from_secs(warm_secs),
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unexpected boolean '{}'", other),
    }
}
