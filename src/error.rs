//! Error types for jsdeps
//!
//! All modules use `JsDepsResult<T>` as their return type.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for jsdeps operations
pub type JsDepsResult<T> = Result<T, JsDepsError>;

/// All errors that can occur in jsdeps
#[derive(Error, Debug)]
pub enum JsDepsError {
    // Engine errors
    #[error("Unrecognized engine type: {0}")]
    UnrecognizedEngine(String),

    #[error("Engine probe failed: {0}")]
    EngineProbe(String),

    #[error("Package manager entry point not found: {0}")]
    EntryPointNotFound(PathBuf),

    #[error("Engine worker failed: {0}")]
    EngineWorker(String),

    // Resolution errors
    #[error("Could not locate '{name}' executable: {reason}")]
    ExecutableLookup { name: String, reason: String },

    #[error("Dependency install failed: {command}, exit code: {code}")]
    InstallFailed { command: String, code: i32 },

    #[error("Dependency install timed out after {}", format_timeout(.0))]
    Timeout(Duration),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML edit error: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

/// Whole seconds as `90s`, anything finer as `50ms`
fn format_timeout(timeout: &Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

impl JsDepsError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Whether this error aborts a resolution (lookup failure, bad exit, timeout)
    pub fn is_fatal_resolution(&self) -> bool {
        matches!(
            self,
            Self::ExecutableLookup { .. } | Self::InstallFailed { .. } | Self::Timeout(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ExecutableLookup { .. } => {
                Some("Install Node.js and npm, or set install.integrated = false")
            }
            Self::Timeout(_) => Some("Raise install.timeout_secs or check the engine is responsive"),
            Self::EntryPointNotFound(_) => {
                Some("Set install.entry_point to the package manager's npm-cli.js")
            }
            Self::InstallFailed { .. } => Some("Re-run with -v to see the package manager output"),
            _ => None,
        }
    }
}
