//! Engine selection and native interpreter detection
//!
//! `EngineContext` owns the process-wide result of probing for a native
//! interpreter. It is created once (normally in `main`) and shared through an
//! `Arc`; the probe itself runs lazily, on the first `auto` resolution, and
//! never again for the lifetime of the context, however many projects or
//! concurrent resolutions ask for it.

use crate::config::EngineConfig;
use crate::engine::{EngineDescriptor, EngineKind, MODULE_PATH_VAR};
use crate::error::{JsDepsError, JsDepsResult};
use crate::process::{display_command, CommandRunner};
use async_trait::async_trait;
use semver::Version;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Kind picked by auto-detection when a native interpreter is available
pub const NATIVE_KIND: EngineKind = EngineKind::Node;

/// Kind picked by auto-detection when no native interpreter is available
pub const FALLBACK_KIND: EngineKind = EngineKind::Trireme;

/// Result of probing for a native interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Available { version: Option<Version> },
    Unavailable { reason: String },
}

impl ProbeOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

/// Checks whether a native interpreter can be run
#[async_trait]
pub trait InterpreterProbe: Send + Sync {
    async fn probe(&self) -> JsDepsResult<ProbeOutcome>;
}

/// Probe that runs `<program> --version`
pub struct VersionProbe {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl VersionProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self::for_program(runner, "node")
    }

    pub fn for_program(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }
}

#[async_trait]
impl InterpreterProbe for VersionProbe {
    async fn probe(&self) -> JsDepsResult<ProbeOutcome> {
        let argv = vec![self.program.clone(), "--version".to_string()];
        let result = self
            .runner
            .run(&argv)
            .await
            .map_err(|e| JsDepsError::EngineProbe(e.to_string()))?;

        if !result.success() {
            return Ok(ProbeOutcome::Unavailable {
                reason: format!(
                    "{} exited with {}",
                    display_command(&argv),
                    result.exit_value
                ),
            });
        }

        Ok(ProbeOutcome::Available {
            version: parse_version(&result.stdout),
        })
    }
}

/// Parse `v18.17.1`-style version output
fn parse_version(output: &str) -> Option<Version> {
    let first = output.lines().next()?.trim();
    Version::parse(first.trim_start_matches('v')).ok()
}

/// Process-wide engine state with single-initialization probe semantics
pub struct EngineContext {
    probe: Arc<dyn InterpreterProbe>,
    outcome: OnceCell<ProbeOutcome>,
    fallback_warned: AtomicBool,
}

impl EngineContext {
    pub fn new(probe: Arc<dyn InterpreterProbe>) -> Self {
        Self {
            probe,
            outcome: OnceCell::new(),
            fallback_warned: AtomicBool::new(false),
        }
    }

    /// Context probing `node --version` through `runner`
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self::new(Arc::new(VersionProbe::new(runner)))
    }

    /// Outcome of the native interpreter probe, running it on first use.
    ///
    /// Concurrent first callers wait on the same probe; a probe that errors
    /// counts as "not available".
    pub async fn native_interpreter(&self) -> &ProbeOutcome {
        self.outcome
            .get_or_init(|| async {
                let outcome = match self.probe.probe().await {
                    Ok(outcome) => outcome,
                    Err(e) => ProbeOutcome::Unavailable {
                        reason: e.to_string(),
                    },
                };
                match &outcome {
                    ProbeOutcome::Available { version: Some(v) } => {
                        info!("Native JavaScript interpreter found (v{})", v)
                    }
                    ProbeOutcome::Available { version: None } => {
                        info!("Native JavaScript interpreter found")
                    }
                    ProbeOutcome::Unavailable { reason } => {
                        debug!("Native JavaScript interpreter not available: {}", reason)
                    }
                }
                outcome
            })
            .await
    }

    /// Probe outcome if the probe already ran
    pub fn probed(&self) -> Option<&ProbeOutcome> {
        self.outcome.get()
    }

    fn warn_fallback_once(&self) {
        if !self.fallback_warned.swap(true, Ordering::SeqCst) {
            warn!(
                "Node.js not found, falling back to {}. Installs may be substantially slower; \
                 install Node.js for faster builds",
                FALLBACK_KIND
            );
        }
    }
}

/// Maps a configured engine preference to a runnable descriptor
#[derive(Clone)]
pub struct EngineSelector {
    context: Arc<EngineContext>,
}

impl EngineSelector {
    pub fn new(context: Arc<EngineContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// Resolve `kind` into a descriptor. Concrete kinds pass straight
    /// through; `AutoDetect` consults the memoized probe.
    pub async fn resolve(
        &self,
        kind: EngineKind,
        command: Option<PathBuf>,
        env: BTreeMap<String, String>,
    ) -> JsDepsResult<EngineDescriptor> {
        let concrete = match kind {
            EngineKind::AutoDetect => self.detect().await,
            other => other,
        };
        debug!("Engine {} resolved to {}", kind, concrete);
        EngineDescriptor::new(concrete, command, env)
    }

    /// Resolve the engine described by configuration
    pub async fn resolve_configured(
        &self,
        config: &EngineConfig,
        override_kind: Option<&str>,
    ) -> JsDepsResult<EngineDescriptor> {
        let kind = Self::configured_kind(config, override_kind);
        let env = Self::launch_env(config)?;
        self.resolve(kind, config.command.clone(), env).await
    }

    async fn detect(&self) -> EngineKind {
        if self.context.native_interpreter().await.is_available() {
            NATIVE_KIND
        } else {
            self.context.warn_fallback_once();
            FALLBACK_KIND
        }
    }

    /// Configured kind with an optional external override applied.
    ///
    /// An unrecognized configured value degrades to `auto`; an unrecognized
    /// override degrades to the configured kind.
    pub fn configured_kind(config: &EngineConfig, override_kind: Option<&str>) -> EngineKind {
        let configured = EngineKind::parse_or(&config.kind, EngineKind::AutoDetect);
        match override_kind {
            Some(value) => EngineKind::parse_or(value, configured),
            None => configured,
        }
    }

    /// Environment overrides for the engine: module search path plus any
    /// explicit variables (which win on conflict)
    pub fn launch_env(config: &EngineConfig) -> JsDepsResult<BTreeMap<String, String>> {
        let mut env = BTreeMap::new();

        if !config.module_paths.is_empty() {
            let joined = std::env::join_paths(&config.module_paths).map_err(|e| {
                JsDepsError::User(format!("invalid engine.module_paths entry: {}", e))
            })?;
            env.insert(
                MODULE_PATH_VAR.to_string(),
                joined.to_string_lossy().into_owned(),
            );
        }

        env.extend(config.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ExecutionResult;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Probe returning a fixed outcome and counting invocations
    struct CountingProbe {
        calls: AtomicUsize,
        outcome: JsDepsResult<bool>,
    }

    impl CountingProbe {
        fn new(available: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome: Ok(available),
            }
        }

        fn erroring() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome: Err(JsDepsError::EngineProbe("spawn refused".to_string())),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InterpreterProbe for CountingProbe {
        async fn probe(&self) -> JsDepsResult<ProbeOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            match &self.outcome {
                Ok(true) => Ok(ProbeOutcome::Available { version: None }),
                Ok(false) => Ok(ProbeOutcome::Unavailable {
                    reason: "not installed".to_string(),
                }),
                Err(e) => Err(JsDepsError::EngineProbe(e.to_string())),
            }
        }
    }

    struct ScriptedRunner {
        response: Mutex<Option<JsDepsResult<ExecutionResult>>>,
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, _argv: &[String]) -> JsDepsResult<ExecutionResult> {
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(ExecutionResult::default()))
        }
    }

    fn selector_with(probe: Arc<CountingProbe>) -> EngineSelector {
        EngineSelector::new(Arc::new(EngineContext::new(probe)))
    }

    #[tokio::test]
    async fn concrete_kinds_pass_through_without_probing() {
        let probe = Arc::new(CountingProbe::new(false));
        let selector = selector_with(probe.clone());

        for kind in EngineKind::all().iter().filter(|k| k.is_concrete()) {
            let desc = selector
                .resolve(*kind, None, BTreeMap::new())
                .await
                .unwrap();
            assert_eq!(desc.kind(), *kind);
        }
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test]
    async fn descriptor_keeps_command_and_env() {
        let selector = selector_with(Arc::new(CountingProbe::new(true)));
        let mut env = BTreeMap::new();
        env.insert(MODULE_PATH_VAR.to_string(), "/opt/js".to_string());

        let desc = selector
            .resolve(
                EngineKind::Rhino,
                Some(PathBuf::from("/usr/bin/rhino")),
                env.clone(),
            )
            .await
            .unwrap();

        assert_eq!(desc.command(), Some(std::path::Path::new("/usr/bin/rhino")));
        assert_eq!(desc.env(), &env);
    }

    #[tokio::test]
    async fn auto_detect_uses_native_when_available() {
        let selector = selector_with(Arc::new(CountingProbe::new(true)));
        let desc = selector
            .resolve(EngineKind::AutoDetect, None, BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(desc.kind(), NATIVE_KIND);
    }

    #[tokio::test]
    async fn auto_detect_falls_back_and_probes_once() {
        let probe = Arc::new(CountingProbe::new(false));
        let selector = selector_with(probe.clone());

        for _ in 0..3 {
            let desc = selector
                .resolve(EngineKind::AutoDetect, None, BTreeMap::new())
                .await
                .unwrap();
            assert_eq!(desc.kind(), FALLBACK_KIND);
        }
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_auto_detects_share_one_probe() {
        let probe = Arc::new(CountingProbe::new(false));
        let selector = selector_with(probe.clone());

        let (a, b, c) = tokio::join!(
            selector.resolve(EngineKind::AutoDetect, None, BTreeMap::new()),
            selector.resolve(EngineKind::AutoDetect, None, BTreeMap::new()),
            selector.resolve(EngineKind::AutoDetect, None, BTreeMap::new()),
        );

        for desc in [a, b, c] {
            assert_eq!(desc.unwrap().kind(), FALLBACK_KIND);
        }
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn probe_error_is_treated_as_not_found() {
        let probe = Arc::new(CountingProbe::erroring());
        let context = Arc::new(EngineContext::new(probe.clone()));
        let selector = EngineSelector::new(context.clone());

        let desc = selector
            .resolve(EngineKind::AutoDetect, None, BTreeMap::new())
            .await
            .unwrap();

        assert_eq!(desc.kind(), FALLBACK_KIND);
        assert!(!context.probed().unwrap().is_available());
    }

    #[tokio::test]
    async fn version_probe_parses_node_output() {
        let runner = Arc::new(ScriptedRunner {
            response: Mutex::new(Some(Ok(ExecutionResult::new(0, "v18.17.1\n", "")))),
        });
        let outcome = VersionProbe::new(runner).probe().await.unwrap();
        assert_eq!(
            outcome,
            ProbeOutcome::Available {
                version: Some(Version::new(18, 17, 1))
            }
        );
    }

    #[tokio::test]
    async fn version_probe_spawn_failure_downgrades_to_unavailable() {
        let runner = Arc::new(ScriptedRunner {
            response: Mutex::new(Some(Err(JsDepsError::command_failed(
                "node --version",
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )))),
        });

        let err = VersionProbe::new(runner.clone()).probe().await.unwrap_err();
        assert!(matches!(err, JsDepsError::EngineProbe(_)));

        runner.response.lock().unwrap().replace(Err(JsDepsError::command_failed(
            "node --version",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        )));
        let context = EngineContext::with_runner(runner);
        assert!(!context.native_interpreter().await.is_available());
    }

    #[tokio::test]
    async fn version_probe_nonzero_exit_is_unavailable() {
        let runner = Arc::new(ScriptedRunner {
            response: Mutex::new(Some(Ok(ExecutionResult::new(127, "", "not found")))),
        });
        let outcome = VersionProbe::new(runner).probe().await.unwrap();
        assert!(!outcome.is_available());
    }

    #[test]
    fn configured_kind_override_precedence() {
        let config = EngineConfig {
            kind: "rhino".to_string(),
            ..EngineConfig::default()
        };

        assert_eq!(EngineSelector::configured_kind(&config, None), EngineKind::Rhino);
        assert_eq!(
            EngineSelector::configured_kind(&config, Some("node")),
            EngineKind::Node
        );
        // Unrecognized override falls back to the configured kind
        assert_eq!(
            EngineSelector::configured_kind(&config, Some("quickjs")),
            EngineKind::Rhino
        );
    }

    #[test]
    fn unrecognized_configured_kind_means_auto() {
        let config = EngineConfig {
            kind: "duktape".to_string(),
            ..EngineConfig::default()
        };
        assert_eq!(
            EngineSelector::configured_kind(&config, None),
            EngineKind::AutoDetect
        );
    }

    #[test]
    fn launch_env_sets_module_path() {
        let mut config = EngineConfig {
            module_paths: vec![PathBuf::from("a"), PathBuf::from("b")],
            ..EngineConfig::default()
        };
        config
            .env
            .insert("NPM_CONFIG_LOGLEVEL".to_string(), "warn".to_string());

        let env = EngineSelector::launch_env(&config).unwrap();
        let expected = std::env::join_paths(["a", "b"])
            .unwrap()
            .to_string_lossy()
            .into_owned();

        assert_eq!(env.get(MODULE_PATH_VAR), Some(&expected));
        assert_eq!(env.get("NPM_CONFIG_LOGLEVEL").map(String::as_str), Some("warn"));
    }

    #[test]
    fn launch_env_empty_by_default() {
        assert!(EngineSelector::launch_env(&EngineConfig::default())
            .unwrap()
            .is_empty());
    }
}
