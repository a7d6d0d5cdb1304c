//! JavaScript engines
//!
//! An engine is anything able to run the package manager's own JS entry
//! point: a locally installed interpreter or one of the embeddable ones.
//! Which one is used is chosen once per configuration scope:
//!
//! | Kind | Program | Notes |
//! |------|---------|-------|
//! | `commonnode` | `node` | Node.js, CommonJS module mode (same launch as `node`) |
//! | `node` | `node` | Node.js |
//! | `phantomjs` | `phantomjs` | headless browser |
//! | `javax` | `jjs` | platform script engine, script args after `--` |
//! | `rhino` | `rhino` | embedded interpreter |
//! | `trireme` | `trireme` | embedded interpreter, auto-detect fallback |
//! | `auto` | - | `node` when installed, otherwise `trireme` |

pub mod host;
pub mod selector;

pub use host::{EngineHost, EngineLauncher, ProcessLauncher, ScriptRequest};
pub use selector::{EngineContext, EngineSelector, InterpreterProbe, ProbeOutcome};

use crate::error::{JsDepsError, JsDepsResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Environment variable carrying extra module search paths
pub const MODULE_PATH_VAR: &str = "NODE_PATH";

/// Configured engine preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Locally installed Node.js in CommonJS mode
    CommonNode,
    /// Locally installed Node.js
    Node,
    /// PhantomJS headless browser
    PhantomJs,
    /// Platform script engine (`jjs`)
    Javax,
    /// Rhino interpreter
    Rhino,
    /// Trireme interpreter
    Trireme,
    /// Pick `Node` if it is installed, `Trireme` otherwise
    #[serde(rename = "auto")]
    AutoDetect,
}

/// How a concrete engine kind is launched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Launch {
    /// Default executable
    pub program: &'static str,
    /// Arguments placed before the script
    pub leading_args: &'static [&'static str],
    /// Separator placed between the script and its arguments
    pub script_args_separator: Option<&'static str>,
}

impl EngineKind {
    /// All kinds, in display order
    pub fn all() -> &'static [Self] {
        &[
            Self::CommonNode,
            Self::Node,
            Self::PhantomJs,
            Self::Javax,
            Self::Rhino,
            Self::Trireme,
            Self::AutoDetect,
        ]
    }

    /// Configuration name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommonNode => "commonnode",
            Self::Node => "node",
            Self::PhantomJs => "phantomjs",
            Self::Javax => "javax",
            Self::Rhino => "rhino",
            Self::Trireme => "trireme",
            Self::AutoDetect => "auto",
        }
    }

    /// Whether this kind names an engine directly (anything but auto)
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Self::AutoDetect)
    }

    /// Launch parameters; `None` for `AutoDetect`, which must be resolved first
    pub fn launch(&self) -> Option<Launch> {
        let launch = match self {
            // Both run on the node binary; the kinds differ only in the
            // module mode the package manager script is loaded in
            Self::CommonNode | Self::Node => Launch {
                program: "node",
                leading_args: &[],
                script_args_separator: None,
            },
            Self::PhantomJs => Launch {
                program: "phantomjs",
                leading_args: &[],
                script_args_separator: None,
            },
            Self::Javax => Launch {
                program: "jjs",
                leading_args: &["-scripting"],
                script_args_separator: Some("--"),
            },
            Self::Rhino => Launch {
                program: "rhino",
                leading_args: &[],
                script_args_separator: None,
            },
            Self::Trireme => Launch {
                program: "trireme",
                leading_args: &[],
                script_args_separator: None,
            },
            Self::AutoDetect => return None,
        };
        Some(launch)
    }

    /// Parse a configured value, substituting `default` when it is not
    /// recognized. Never fails; an unknown value is reported as a warning.
    pub fn parse_or(value: &str, default: EngineKind) -> EngineKind {
        match value.parse() {
            Ok(kind) => kind,
            Err(_) => {
                warn!(
                    "Unrecognized engine type '{}', using '{}' instead",
                    value, default
                );
                default
            }
        }
    }
}

impl FromStr for EngineKind {
    type Err = JsDepsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "commonnode" | "common-node" => Ok(Self::CommonNode),
            "node" => Ok(Self::Node),
            "phantomjs" | "phantom" => Ok(Self::PhantomJs),
            "javax" | "nashorn" => Ok(Self::Javax),
            "rhino" => Ok(Self::Rhino),
            "trireme" => Ok(Self::Trireme),
            "auto" | "autodetect" => Ok(Self::AutoDetect),
            _ => Err(JsDepsError::UnrecognizedEngine(s.to_string())),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runnable form of an engine kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineDescriptor {
    kind: EngineKind,
    launch: Launch,
    command: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl EngineDescriptor {
    /// Build a descriptor for a concrete kind
    pub(crate) fn new(
        kind: EngineKind,
        command: Option<PathBuf>,
        env: BTreeMap<String, String>,
    ) -> JsDepsResult<Self> {
        let launch = kind.launch().ok_or_else(|| {
            JsDepsError::Internal("engine descriptor requires a concrete kind".to_string())
        })?;
        Ok(Self {
            kind,
            launch,
            command,
            env,
        })
    }

    /// The concrete kind this descriptor launches
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Explicit executable override, if any
    pub fn command(&self) -> Option<&Path> {
        self.command.as_deref()
    }

    /// Environment overrides for the engine process
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Full command line running `script` with `args` on this engine
    pub fn command_line(&self, script: &Path, args: &[String]) -> Vec<String> {
        let program = match &self.command {
            Some(path) => path.display().to_string(),
            None => self.launch.program.to_string(),
        };

        let mut argv = vec![program];
        argv.extend(self.launch.leading_args.iter().map(|a| a.to_string()));
        argv.push(script.display().to_string());
        if let Some(sep) = self.launch.script_args_separator {
            argv.push(sep.to_string());
        }
        argv.extend(args.iter().cloned());
        argv
    }
}

impl fmt::Display for EngineDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.command {
            Some(cmd) => write!(f, "{} ({})", self.kind, cmd.display()),
            None => write!(f, "{}", self.kind),
        }
    }
}
