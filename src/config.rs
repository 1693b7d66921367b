use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// Number of readings the cache holds before evicting.
pub const DEFAULT_CACHE_CAPACITY: usize = 5;

/// Most urgent task priority.
pub const MIN_PRIORITY: i64 = 1;

/// Least urgent task priority.
pub const MAX_PRIORITY: i64 = 10;

/// Priority assigned when a submission omits it.
pub const DEFAULT_PRIORITY: i64 = 5;

/// Tick count assigned when a submission omits it.
pub const DEFAULT_TICKS: i64 = 1;

/// Upper bound on tick-steps a single run call may request.
pub const DEFAULT_MAX_RUN_TICKS: u32 = 1000;

/// Timeout applied to reading-service requests (5 s).
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "LAB_ENGINE_CONFIG";

/// Where the cache fetches readings from on a miss.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory store seeded with the demo readings.
    Sample,
    /// JSON array of readings on disk.
    File { path: String },
    /// Remote reading service exposing `GET /api/readings/{id}`.
    Http {
        base_url: String,
        #[serde(default = "default_store_timeout_ms")]
        timeout_ms: u64,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Sample
    }
}

fn default_store_timeout_ms() -> u64 {
    DEFAULT_STORE_TIMEOUT_MS
}

/// Top-level configuration for the lab engine service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Address the HTTP server listens on.
    pub bind_addr: String,
    /// Fixed capacity of the reading cache.
    pub cache_capacity: usize,
    /// Maximum ticks accepted by one scheduler run.
    pub max_run_ticks: u32,
    /// Backing reading store.
    pub store: StoreConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_run_ticks: DEFAULT_MAX_RUN_TICKS,
            store: StoreConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid engine config")?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Resolve the config from an explicit path, then `LAB_ENGINE_CONFIG`, then defaults.
    pub fn resolve(explicit: Option<String>) -> Result<Self> {
        let path = explicit.or_else(|| std::env::var(CONFIG_ENV_VAR).ok());
        match path {
            Some(p) if !p.trim().is_empty() => Self::load(Path::new(&p)),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(anyhow!("cache_capacity must be > 0"));
        }
        if self.max_run_ticks == 0 {
            return Err(anyhow!("max_run_ticks must be > 0"));
        }
        Ok(())
    }
}
