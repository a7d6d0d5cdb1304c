//! External process execution
//!
//! `CommandRunner` is the seam every process spawn goes through: executable
//! lookups, native package manager installs and the interpreter probe. The
//! production `SystemRunner` runs the command to completion and hands back
//! both output streams as complete text buffers.

use crate::error::{JsDepsError, JsDepsResult};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Outcome of one external command or engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_value: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn new(exit_value: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_value,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_value == 0
    }
}

/// Receives output one line at a time
pub trait LineSink: Send {
    fn push_line(&mut self, line: &str);
}

/// Sink that accumulates lines into a single newline-joined buffer
#[derive(Debug, Default)]
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    pub fn into_string(self) -> String {
        self.text
    }
}

impl LineSink for TextBuffer {
    fn push_line(&mut self, line: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(line);
    }
}

/// Executes an external command given as an argv vector
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv[0]` with the remaining arguments until it exits.
    ///
    /// An `Err` means the process could not be spawned at all; a process that
    /// ran and failed is an `Ok` with a non-zero `exit_value`.
    async fn run(&self, argv: &[String]) -> JsDepsResult<ExecutionResult>;
}

/// Production runner that spawns real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, argv: &[String]) -> JsDepsResult<ExecutionResult> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| JsDepsError::Internal("empty command line".to_string()))?;
        let command_line = display_command(argv);
        debug!("Executing: {}", command_line);

        let mut child = Command::new(program)
            .args(args)
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

        // Killed by a signal: no exit code, report as a generic failure
        let exit_value = status.code().unwrap_or(-1);
        debug!("{} exited with {}", command_line, exit_value);

        Ok(ExecutionResult {
            exit_value,
            stdout,
            stderr,
        })
    }
}

/// Drain stdout and stderr of a spawned child into text buffers.
///
/// Both pipes are read concurrently so a chatty stderr can't stall the child
/// while we wait on stdout.
pub(crate) async fn collect_child_output(
    child: &mut tokio::process::Child,
) -> JsDepsResult<(String, String)> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| JsDepsError::Internal("child stdout not piped".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| JsDepsError::Internal("child stderr not piped".to_string()))?;

    let mut out = TextBuffer::default();
    let mut err = TextBuffer::default();
    let (out_read, err_read) =
        tokio::join!(pump_lines(stdout, &mut out), pump_lines(stderr, &mut err));
    out_read?;
    err_read?;

    Ok((out.into_string(), err.into_string()))
}

/// Forward every line until EOF. Invalid UTF-8 is replaced rather than ending
/// the read; the pipe must stay open until the child closes it.
async fn pump_lines<R>(reader: R, sink: &mut dyn LineSink) -> JsDepsResult<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| JsDepsError::io("reading child output", e))?;
        if read == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        sink.push_line(line.trim_end_matches(['\n', '\r']));
    }
}

/// Render an argv vector for error messages and logs
pub fn display_command(argv: &[String]) -> String {
    argv.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn text_buffer_joins_lines() {
        let mut buf = TextBuffer::default();
        buf.push_line("a");
        buf.push_line("b");
        assert_eq!(buf.into_string(), "a\nb");
    }

    #[test]
    fn execution_result_success() {
        assert!(ExecutionResult::new(0, "", "").success());
        assert!(!ExecutionResult::new(2, "", "").success());
    }

    #[tokio::test]
    async fn empty_argv_is_rejected() {
        let err = SystemRunner::new().run(&[]).await.unwrap_err();
        assert!(matches!(err, JsDepsError::Internal(_)));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let err = SystemRunner::new()
            .run(&argv(&["jsdeps-definitely-not-a-real-binary"]))
            .await
            .unwrap_err();
        assert!(matches!(err, JsDepsError::CommandFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_both_streams_and_exit_code() {
        let result = SystemRunner::new()
            .run(&argv(&["sh", "-c", "echo a; echo b; echo x >&2; echo y >&2; exit 3"]))
            .await
            .unwrap();

        assert_eq!(result.exit_value, 3);
        assert_eq!(result.stdout, "a\nb");
        assert_eq!(result.stderr, "x\ny");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn invalid_utf8_does_not_cut_output() {
        let script = "printf 'bad \\377 byte\\n'; sleep 0.2; \
                      i=0; while [ $i -lt 2000 ]; do echo line $i; i=$((i+1)); done; \
                      printf 'warn \\377\\n' >&2; echo done; exit 0";
        let result = SystemRunner::new()
            .run(&argv(&["sh", "-c", script]))
            .await
            .unwrap();

        assert_eq!(result.exit_value, 0);
        assert!(result.stdout.starts_with("bad \u{FFFD} byte\nline 0"));
        assert!(result.stdout.contains("line 1999"));
        assert_eq!(result.stdout.lines().last(), Some("done"));
        assert_eq!(result.stderr, "warn \u{FFFD}");
    }

    #[tokio::test]
    async fn crlf_line_endings_are_stripped() {
        let mut buf = TextBuffer::default();
        pump_lines(&b"one\r\ntwo"[..], &mut buf).await.unwrap();
        assert_eq!(buf.into_string(), "one\ntwo");
    }
}
