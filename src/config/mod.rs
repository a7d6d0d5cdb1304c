//! Configuration management for jsdeps

pub mod schema;

pub use schema::{CacheConfig, Config, EngineConfig, InstallConfig, InstallSubcommand};

use crate::error::{JsDepsError, JsDepsResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Name of the project-local configuration file
pub const LOCAL_CONFIG_FILE: &str = "jsdeps.toml";

/// Environment variable overriding `engine.kind`
pub const ENGINE_ENV_VAR: &str = "JSDEPS_ENGINE";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jsdeps")
            .join("config.toml")
    }

    /// Look for a project-local config in the project root
    pub fn find_local_config(project_dir: &Path) -> Option<PathBuf> {
        let candidate = project_dir.join(LOCAL_CONFIG_FILE);
        candidate.is_file().then_some(candidate)
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> JsDepsResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load the global config with a project-local file layered on top.
    ///
    /// Keys present in the local file win; everything else comes from the
    /// global file or the defaults.
    pub async fn load_merged(&self, local: Option<&Path>) -> JsDepsResult<Config> {
        let mut merged = if self.config_path.exists() {
            self.read_table(&self.config_path).await?
        } else {
            toml::Table::new()
        };

        if let Some(path) = local {
            debug!("Merging local config {}", path.display());
            let overlay = self.read_table(path).await?;
            merge_tables(&mut merged, overlay);
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| JsDepsError::ConfigInvalid {
                path: local.unwrap_or(&self.config_path).to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> JsDepsResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| JsDepsError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| JsDepsError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    async fn read_table(&self, path: &Path) -> JsDepsResult<toml::Table> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| JsDepsError::io(format!("reading config from {}", path.display()), e))?;

        content.parse().map_err(|e: toml::de::Error| JsDepsError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> JsDepsResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            JsDepsError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    pub async fn ensure_config_dir(&self) -> JsDepsResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| JsDepsError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively merge `overlay` into `base`, overlay values winning
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
