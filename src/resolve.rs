//! Dependency resolution
//!
//! One resolution walks this state machine:
//!
//! ```text
//! manifest absent   -> delete install dir and cache record, output = {}
//! manifest present  -> cache gate
//!     fresh record  -> recorded output
//!     otherwise     -> native install (located package manager binary)
//!                   |  embedded install (engine runs the JS entry point, with timeout)
//!                   -> exit 0: list install dir, record it
//!                   -> exit != 0, lookup failure, timeout: error, record untouched
//! ```

use crate::cache::{CacheGate, CacheState, CachedOutput};
use crate::config::{Config, EngineConfig, InstallSubcommand};
use crate::engine::{EngineHost, EngineSelector, ScriptRequest};
use crate::error::{JsDepsError, JsDepsResult};
use crate::platform::Platform;
use crate::process::{display_command, CommandRunner, ExecutionResult, SystemRunner};
use crate::report::{report_output, BuildLog, TracingLog};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

/// Name of the cache record kept for resolution
const CACHE_RECORD_NAME: &str = "resolve";

/// Everything one resolution needs, with paths made absolute
#[derive(Debug, Clone)]
pub struct ResolveSettings {
    pub project_root: PathBuf,
    pub manifest: PathBuf,
    pub install_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub integrated: bool,
    pub package_manager: String,
    pub subcommand: InstallSubcommand,
    pub extra_args: Vec<String>,
    pub timeout: Duration,
    pub entry_point: Option<PathBuf>,
    pub engine: EngineConfig,
    /// External engine kind override (environment or command line)
    pub engine_override: Option<String>,
}

impl ResolveSettings {
    pub fn from_config(config: &Config, project_root: &Path) -> Self {
        let root = project_root.to_path_buf();
        let cache_dir = match &config.cache.dir {
            Some(dir) => root.join(dir),
            None => root.join(".jsdeps").join("cache"),
        };

        Self {
            manifest: root.join(&config.install.manifest),
            install_dir: root.join(&config.install.install_dir),
            cache_dir,
            integrated: config.install.integrated,
            package_manager: config.install.package_manager.clone(),
            subcommand: config.install.subcommand,
            extra_args: config.install.extra_args.clone(),
            timeout: config.install.timeout(),
            entry_point: config.install.entry_point.as_ref().map(|p| root.join(p)),
            engine: config.engine.clone(),
            engine_override: None,
            project_root: root,
        }
    }

    pub fn with_engine_override(mut self, kind: Option<String>) -> Self {
        self.engine_override = kind;
        self
    }

    /// Gate guarding this project's install
    pub fn gate(&self) -> CacheGate {
        CacheGate::in_dir(&self.cache_dir, CACHE_RECORD_NAME)
    }

    /// Package manager arguments: `<subcommand> --prefix <root> [extra...]`
    pub fn install_args(&self) -> Vec<String> {
        let mut args = vec![
            self.subcommand.as_arg().to_string(),
            "--prefix".to_string(),
            self.project_root.display().to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Files present under the install directory after a successful install
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub files: BTreeSet<PathBuf>,
}

impl ResolutionOutcome {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

impl CachedOutput for ResolutionOutcome {
    /// Symlinks count as present even when their target is gone, matching
    /// how `list_files` recorded them.
    fn is_intact(&self) -> bool {
        self.files
            .iter()
            .all(|f| std::fs::symlink_metadata(f).is_ok())
    }
}

/// Which branch a resolution ended in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    NoManifest,
    CacheHit,
    Installed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub kind: ResolutionKind,
    pub outcome: ResolutionOutcome,
}

/// Ensures a project's declared packages are installed
pub struct DependencyResolver {
    settings: ResolveSettings,
    selector: EngineSelector,
    host: EngineHost,
    runner: Arc<dyn CommandRunner>,
    log: Arc<dyn BuildLog>,
    platform: Platform,
}

impl DependencyResolver {
    pub fn new(settings: ResolveSettings, selector: EngineSelector, host: EngineHost) -> Self {
        Self {
            settings,
            selector,
            host,
            runner: Arc::new(SystemRunner::new()),
            log: Arc::new(TracingLog),
            platform: Platform::detect(),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_log(mut self, log: Arc<dyn BuildLog>) -> Self {
        self.log = log;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn settings(&self) -> &ResolveSettings {
        &self.settings
    }

    /// Bring the install directory in line with the manifest
    pub async fn resolve(&self) -> JsDepsResult<Resolution> {
        let gate = self.settings.gate();

        if !self.settings.manifest.is_file() {
            info!(
                "No manifest at {}, removing {}",
                self.settings.manifest.display(),
                self.settings.install_dir.display()
            );
            remove_dir_if_present(&self.settings.install_dir).await?;
            gate.clear().await?;
            return Ok(Resolution {
                kind: ResolutionKind::NoManifest,
                outcome: ResolutionOutcome::default(),
            });
        }

        let gated = gate
            .run(self.settings.manifest.as_path(), || self.install())
            .await?;

        let kind = if gated.executed {
            ResolutionKind::Installed
        } else {
            info!("Dependencies up to date");
            ResolutionKind::CacheHit
        };

        Ok(Resolution {
            kind,
            outcome: gated.output,
        })
    }

    /// Cache state for the current manifest
    pub async fn cache_state(&self) -> JsDepsResult<CacheState> {
        self.settings
            .gate()
            .state::<_, ResolutionOutcome>(self.settings.manifest.as_path())
            .await
    }

    async fn install(&self) -> JsDepsResult<ResolutionOutcome> {
        if self.settings.integrated {
            self.install_native().await?;
        } else {
            self.install_embedded().await?;
        }

        let files = list_files(&self.settings.install_dir).await?;
        info!("Installed dependencies, {} files", files.len());
        Ok(ResolutionOutcome { files })
    }

    async fn install_native(&self) -> JsDepsResult<()> {
        let executable = self.locate(&self.settings.package_manager).await?;

        let mut argv = Vec::new();
        if let Some(command) = &self.settings.engine.command {
            if self.platform.allows_engine_prefix() {
                argv.push(command.display().to_string());
            }
        }
        argv.push(executable);
        argv.extend(self.settings.install_args());

        let command_line = display_command(&argv);
        info!("Running {}", command_line);

        // No deadline on this path; an install runs until it exits
        let result = self.runner.run(&argv).await?;
        self.finish(command_line, &result)
    }

    async fn install_embedded(&self) -> JsDepsResult<()> {
        let script = self.settings.entry_point.clone().ok_or_else(|| {
            JsDepsError::User("install.entry_point must be set for embedded installs".to_string())
        })?;
        if !script.is_file() {
            return Err(JsDepsError::EntryPointNotFound(script));
        }

        let engine = self
            .selector
            .resolve_configured(&self.settings.engine, self.settings.engine_override.as_deref())
            .await?;

        let request = ScriptRequest {
            args: self.settings.install_args(),
            working_dir: self.settings.project_root.clone(),
            env: BTreeMap::new(),
            script,
        };
        let command_line = display_command(&engine.command_line(&request.script, &request.args));
        info!("Running {} on {}", command_line, engine);

        let result = self.host.run(engine, request, self.settings.timeout).await?;
        self.finish(command_line, &result)
    }

    /// Forward output and classify the exit code
    fn finish(&self, command: String, result: &ExecutionResult) -> JsDepsResult<()> {
        report_output(self.log.as_ref(), result);
        if result.success() {
            Ok(())
        } else {
            Err(JsDepsError::InstallFailed {
                command,
                code: result.exit_value,
            })
        }
    }

    /// Full path of `program` via the platform lookup command
    async fn locate(&self, program: &str) -> JsDepsResult<String> {
        let argv = self.platform.locate_command(program);
        let lookup_failed = |reason: String| JsDepsError::ExecutableLookup {
            name: program.to_string(),
            reason,
        };

        let result = self
            .runner
            .run(&argv)
            .await
            .map_err(|e| lookup_failed(e.to_string()))?;
        if !result.success() {
            return Err(lookup_failed(format!(
                "{} exited with {}",
                display_command(&argv),
                result.exit_value
            )));
        }

        let path = self
            .platform
            .pick_located(&result.stdout)
            .ok_or_else(|| lookup_failed("lookup printed no path".to_string()))?;
        debug!("Located {} at {}", program, path);
        Ok(path)
    }
}

async fn remove_dir_if_present(dir: &Path) -> JsDepsResult<()> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(JsDepsError::io(format!("removing {}", dir.display()), e)),
    }
}

/// Every file below `root`, recursively. A missing root is empty.
async fn list_files(root: &Path) -> JsDepsResult<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    if !root.is_dir() {
        return Ok(files);
    }

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| JsDepsError::io(format!("listing {}", dir.display()), e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| JsDepsError::io(format!("listing {}", dir.display()), e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| JsDepsError::io(format!("inspecting {}", entry.path().display()), e))?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else {
                files.insert(entry.path());
            }
        }
    }

    Ok(files)
}
