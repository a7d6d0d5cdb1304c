//! Configuration schema for jsdeps
//!
//! Global configuration is stored at `~/.config/jsdeps/config.toml`; a
//! project may override any key in its own `jsdeps.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// JavaScript engine settings
    pub engine: EngineConfig,

    /// Dependency install settings
    pub install: InstallConfig,

    /// Result cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// JavaScript engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine type (auto, node, commonnode, phantomjs, javax, rhino, trireme).
    /// Kept as a string so an unknown value degrades to a warning instead of
    /// a parse failure.
    pub kind: String,

    /// Explicit engine executable, replacing the kind's default program
    pub command: Option<PathBuf>,

    /// Extra module search path entries, exported as NODE_PATH
    pub module_paths: Vec<PathBuf>,

    /// Extra environment variables for the engine
    pub env: BTreeMap<String, String>,

    /// Number of embedded engine workers
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: "auto".to_string(),
            command: None,
            module_paths: vec![],
            env: BTreeMap::new(),
            workers: 1,
        }
    }
}

/// Package manager subcommand used to resolve dependencies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallSubcommand {
    #[default]
    Install,
    Update,
    Ci,
}

impl InstallSubcommand {
    pub fn as_arg(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Update => "update",
            Self::Ci => "ci",
        }
    }
}

impl fmt::Display for InstallSubcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// Dependency install configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Use the natively installed package manager binary instead of an
    /// embedded engine
    pub integrated: bool,

    /// Package manager executable name looked up on PATH
    pub package_manager: String,

    /// Subcommand passed to the package manager
    pub subcommand: InstallSubcommand,

    /// Extra arguments appended after `--prefix <project>`
    pub extra_args: Vec<String>,

    /// Upper bound for an embedded engine install, in seconds
    pub timeout_secs: u64,

    /// Package manager JS entry point (e.g. npm-cli.js) for embedded installs
    pub entry_point: Option<PathBuf>,

    /// Manifest file, relative to the project root
    pub manifest: PathBuf,

    /// Module install directory, relative to the project root
    pub install_dir: PathBuf,
}

impl InstallConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            integrated: true,
            package_manager: "npm".to_string(),
            subcommand: InstallSubcommand::Install,
            extra_args: vec![],
            timeout_secs: 2 * 60 * 60,
            entry_point: None,
            manifest: PathBuf::from("package.json"),
            install_dir: PathBuf::from("node_modules"),
        }
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory (default: `<project>/.jsdeps/cache`)
    pub dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[engine]"));
        assert!(toml.contains("[install]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine.kind, "auto");
        assert!(config.install.integrated);
        assert_eq!(config.install.timeout(), Duration::from_secs(7200));
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [install]
            integrated = false
            subcommand = "ci"
            entry_point = "tools/npm/bin/npm-cli.js"

            [engine]
            kind = "trireme"
            module_paths = ["lib/js"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.install.integrated);
        assert_eq!(config.install.subcommand, InstallSubcommand::Ci);
        assert_eq!(config.engine.kind, "trireme");
        assert_eq!(config.engine.module_paths, vec![PathBuf::from("lib/js")]);
        assert_eq!(config.install.manifest, PathBuf::from("package.json")); // default preserved
    }

    #[test]
    fn unknown_engine_kind_still_parses() {
        let config: Config = toml::from_str("[engine]\nkind = \"spidermonkey\"").unwrap();
        assert_eq!(config.engine.kind, "spidermonkey");
    }
}
