//! Forwarding of captured install output to the build log
//!
//! Every stdout line is reported at info level. Stderr lines are reported at
//! info level when the install succeeded and at error level when it failed.
//! Build-log consumers parse this mapping, so it must not drift.

use crate::process::ExecutionResult;

/// Tracing target used for forwarded package manager output
pub const INSTALL_TARGET: &str = "jsdeps::install";

/// Line-oriented log sink for package manager output
pub trait BuildLog: Send + Sync {
    fn info(&self, line: &str);
    fn error(&self, line: &str);
}

/// Production log that emits `tracing` events on [`INSTALL_TARGET`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl BuildLog for TracingLog {
    fn info(&self, line: &str) {
        tracing::info!(target: INSTALL_TARGET, "{}", line);
    }

    fn error(&self, line: &str) {
        tracing::error!(target: INSTALL_TARGET, "{}", line);
    }
}

/// Forward both captured streams of `result` to `log`, line by line
pub fn report_output(log: &dyn BuildLog, result: &ExecutionResult) {
    for line in result.stdout.lines() {
        log.info(line);
    }

    let failed = !result.success();
    for line in result.stderr.lines() {
        if failed {
            log.error(line);
        } else {
            log.info(line);
        }
    }
}
