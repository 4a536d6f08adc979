use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::reconcile::types::{Mode, Ruleset};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VexsyncConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub reconciler: ReconcilerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
}

/// Policy surface for the reconciliation cycle. Validated once at startup;
/// components receive the struct read-only and never re-read flags per call.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub enabled: bool,
    pub mode: Mode,
    pub ruleset: Ruleset,
    /// Seconds between reconciliation cycles in `vexsync run`.
    pub interval_secs: u64,
    /// Bounded idle sleep between heartbeat due-task checks.
    pub poll_interval_ms: u64,
}

impl Default for VexsyncConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            reconciler: ReconcilerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_vexsync_dir()
            .join("store.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hash".into(),
        }
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: Mode::Propose,
            ruleset: Ruleset::Lenient,
            interval_secs: 300,
            poll_interval_ms: 200,
        }
    }
}

/// Returns `~/.vexsync/`
pub fn default_vexsync_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".vexsync")
}

/// Returns the default config file path: `~/.vexsync/config.toml`
pub fn default_config_path() -> PathBuf {
    default_vexsync_dir().join("config.toml")
}

impl VexsyncConfig {
    /// Load config from TOML file (if it exists), apply env var overrides,
    /// then validate cross-flag dependencies.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides and validate.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            VexsyncConfig::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (VEXSYNC_DB, VEXSYNC_MODE, VEXSYNC_RULESET, VEXSYNC_LOG_LEVEL).
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("VEXSYNC_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("VEXSYNC_MODE") {
            self.reconciler.mode = val.parse().map_err(anyhow::Error::msg)?;
        }
        if let Ok(val) = std::env::var("VEXSYNC_RULESET") {
            self.reconciler.ruleset = val.parse().map_err(anyhow::Error::msg)?;
        }
        if let Ok(val) = std::env::var("VEXSYNC_LOG_LEVEL") {
            self.server.log_level = val;
        }
        Ok(())
    }

    /// Validate cross-flag dependencies once at startup. Downstream components
    /// assume the config handed to them is already valid.
    pub fn validate(&self) -> Result<()> {
        if self.reconciler.mode == Mode::Apply && !self.reconciler.enabled {
            bail!("reconciler.mode = \"apply\" requires reconciler.enabled = true");
        }
        if self.reconciler.interval_secs == 0 {
            bail!("reconciler.interval_secs must be positive");
        }
        Ok(())
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
