//! Common subprocess runner for capability adapters.
//!
//! Media tools (ffmpeg, edge-tts, whisper) are run to completion with their
//! output captured. The child is killed when the returned future is dropped,
//! so cancelling a run also stops whatever tool it was waiting on.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Lines of stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 12;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to spawn command '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Command '{program}' failed ({status}): {stderr_tail}")]
    Failed {
        program: String,
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        status: String,
        stderr_tail: String,
    },
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runner for external media tools.
pub struct CommandRunner;

impl CommandRunner {
    /// Run `program` with `args` and wait for it to exit.
    ///
    /// # Arguments
    ///
    /// * `program` - Executable name or path
    /// * `args` - Command line arguments
    /// * `working_dir` - Optional working directory for the child
    ///
    /// # Errors
    ///
    /// `RunnerError::Spawn` if the program cannot be started and
    /// `RunnerError::Failed` on a non-zero exit, carrying the tail of stderr.
    pub async fn run<I, S>(
        program: &str,
        args: I,
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput, RunnerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        debug!(program, "Spawning command");

        let output = cmd.output().await.map_err(|source| RunnerError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(RunnerError::Failed {
                program: program.to_string(),
                code: output.status.code(),
                status: output.status.to_string(),
                stderr_tail: tail_lines(&stderr, STDERR_TAIL_LINES),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

/// The last `n` non-empty lines of `text`, joined with newlines.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_lines() {
        assert_eq!(tail_lines("a\n\nb\nc\n", 2), "b\nc");
        assert_eq!(tail_lines("only", 5), "only");
        assert_eq!(tail_lines("", 3), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_echo() {
        let output = CommandRunner::run("echo", ["hello"], None).await.unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_invalid_command() {
        let result = CommandRunner::run("nonexistent-command-xyz", Vec::<String>::new(), None).await;

        match result {
            Err(RunnerError::Spawn { program, .. }) => {
                assert_eq!(program, "nonexistent-command-xyz")
            }
            other => panic!("Expected Spawn error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_failure_captures_stderr() {
        let result =
            CommandRunner::run("sh", ["-c", "echo first >&2; echo broken pipe >&2; exit 3"], None)
                .await;

        match result {
            Err(RunnerError::Failed {
                code, stderr_tail, ..
            }) => {
                assert_eq!(code, Some(3));
                assert!(stderr_tail.contains("broken pipe"));
            }
            other => panic!("Expected Failed error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_in_working_dir() {
        let temp = tempfile::tempdir().unwrap();
        let output = CommandRunner::run("pwd", Vec::<String>::new(), Some(temp.path()))
            .await
            .unwrap();
        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(temp.path()).unwrap());
    }
}
