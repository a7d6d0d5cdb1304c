//! Embedded engine execution
//!
//! Scripts run as units of work on a small worker pool. The caller gets a
//! task back and awaits it with a deadline; when the deadline passes the
//! task is aborted, which drops the running engine (killing its process)
//! and hands the worker slot back to the pool.

use crate::engine::EngineDescriptor;
use crate::error::{JsDepsError, JsDepsResult};
use crate::process::{collect_child_output, display_command, ExecutionResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

/// A script to run on an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    /// JS entry point
    pub script: PathBuf,
    /// Arguments passed to the script
    pub args: Vec<String>,
    /// Working directory of the run
    pub working_dir: PathBuf,
    /// Environment on top of the engine's own overrides
    pub env: BTreeMap<String, String>,
}

/// Capability to run a script on a resolved engine
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn execute(
        &self,
        engine: &EngineDescriptor,
        request: &ScriptRequest,
    ) -> JsDepsResult<ExecutionResult>;
}

/// Launcher that runs the engine as a child process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

#[async_trait]
impl EngineLauncher for ProcessLauncher {
    async fn execute(
        &self,
        engine: &EngineDescriptor,
        request: &ScriptRequest,
    ) -> JsDepsResult<ExecutionResult> {
        let argv = engine.command_line(&request.script, &request.args);
        let command_line = display_command(&argv);
        debug!("Running on {}: {}", engine, command_line);

        let (program, args) = argv
            .split_first()
            .ok_or_else(|| JsDepsError::Internal("empty engine command line".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .envs(engine.env())
            .envs(&request.env)
            .current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| JsDepsError::command_failed(&command_line, e))?;

        let (stdout, stderr) = collect_child_output(&mut child).await?;
        let status = child
            .wait()
            .await
            .map_err(|e| JsDepsError::command_failed(&command_line, e))?;

        Ok(ExecutionResult {
            exit_value: status.code().unwrap_or(-1),
            stdout,
            stderr,
        })
    }
}

/// Worker pool running scripts on engines
#[derive(Clone)]
pub struct EngineHost {
    launcher: Arc<dyn EngineLauncher>,
    workers: Arc<Semaphore>,
}

impl EngineHost {
    /// Create a pool of `workers` slots (at least one)
    pub fn new(launcher: Arc<dyn EngineLauncher>, workers: usize) -> Self {
        Self {
            launcher,
            workers: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Pool backed by child processes
    pub fn with_processes(workers: usize) -> Self {
        Self::new(Arc::new(ProcessLauncher), workers)
    }

    /// Number of idle worker slots
    pub fn idle_workers(&self) -> usize {
        self.workers.available_permits()
    }

    /// Queue a script run. The worker slot is held for as long as the
    /// returned task is alive.
    pub fn spawn(
        &self,
        engine: EngineDescriptor,
        request: ScriptRequest,
    ) -> JoinHandle<JsDepsResult<ExecutionResult>> {
        let launcher = Arc::clone(&self.launcher);
        let workers = Arc::clone(&self.workers);

        tokio::spawn(async move {
            let _permit = workers
                .acquire_owned()
                .await
                .map_err(|_| JsDepsError::EngineWorker("engine pool closed".to_string()))?;
            launcher.execute(&engine, &request).await
        })
    }

    /// Run a script and wait at most `timeout` for it, including any time
    /// spent waiting for a free worker
    pub async fn run(
        &self,
        engine: EngineDescriptor,
        request: ScriptRequest,
        timeout: Duration,
    ) -> JsDepsResult<ExecutionResult> {
        let mut task = self.spawn(engine, request);

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(JsDepsError::EngineWorker(join_err.to_string())),
            Err(_) => {
                task.abort();
                Err(JsDepsError::Timeout(timeout))
            }
        }
    }
}
