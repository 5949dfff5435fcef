//! Claude CLI spawning.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::response::parse_response;
use crate::config::ClaudeCliConfig;
use crate::error::ClaudeError;

/// Name of the executable looked up on PATH.
pub const CLAUDE_BINARY: &str = "claude";

/// How long the output readers may take to finish once the process exited.
pub const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Find `claude` on PATH.
///
/// Uses the `which` crate for cross-platform executable detection.
pub fn detect_cli_path() -> Option<PathBuf> {
    which::which(CLAUDE_BINARY).ok()
}

/// Pick the executable to run.
///
/// A non-blank configured path is used as given; otherwise PATH is searched.
/// Either way the result must be an executable file.
pub fn resolve_executable(configured: &str) -> Result<PathBuf, ClaudeError> {
    let path = if configured.trim().is_empty() {
        detect_cli_path().ok_or(ClaudeError::ExecutableNotFound)?
    } else {
        PathBuf::from(configured)
    };

    if !is_executable(&path) {
        return Err(ClaudeError::NotExecutable(path));
    }
    Ok(path)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Arguments for a one-shot, JSON-formatted run.
///
/// The prompt is always the last argument.
pub fn build_args(prompt: &str, model_id: &str) -> Vec<String> {
    let mut args = vec![
        "-p".to_string(),
        "--output-format".to_string(),
        "json".to_string(),
    ];
    let model_id = model_id.trim();
    if !model_id.is_empty() {
        args.push("--model".to_string());
        args.push(model_id.to_string());
    }
    args.push(prompt.to_string());
    args
}

/// What a finished process left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was killed by a signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// stderr if it says anything, else stdout.
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// One run of an external program.
#[derive(Debug, Clone)]
pub struct CliInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl CliInvocation {
    /// Invocation of the Claude CLI for `prompt`.
    pub fn claude(config: &ClaudeCliConfig, prompt: &str) -> Result<Self, ClaudeError> {
        Ok(Self {
            program: resolve_executable(&config.executable_path)?,
            args: build_args(prompt, &config.model_id),
            timeout: config.timeout(),
        })
    }

    /// Spawn the program and wait for it, bounded by the timeout.
    ///
    /// stdin is closed right away so the child never waits for input. Both
    /// output streams are drained concurrently while the process runs, so a
    /// chatty child cannot block on a full pipe. On timeout the child is
    /// killed and reaped before returning. Dropping the future kills the
    /// child as well.
    pub async fn run(self) -> Result<ProcessOutput, ClaudeError> {
        debug!(
            "Spawning {} with {} arguments (timeout {}s)",
            self.program.display(),
            self.args.len(),
            self.timeout.as_secs()
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ClaudeError::SpawnFailed)?;

        drop(child.stdin.take());

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClaudeError::OutputReadError("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ClaudeError::OutputReadError("stderr was not captured".to_string()))?;
        let mut drains = DrainTasks::spawn(stdout, stderr);

        let status = match timeout(self.timeout, child.wait()).await {
            Ok(status) => status.map_err(ClaudeError::WaitFailed)?,
            Err(_) => {
                warn!(
                    "{} did not finish within {}s, killing it",
                    self.program.display(),
                    self.timeout.as_secs()
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed out process: {}", e);
                }
                drains.abort();
                return Err(ClaudeError::Timeout(self.timeout.as_secs()));
            }
        };

        let (stdout, stderr) = drains.join(DRAIN_GRACE).await?;
        let code = status.code().unwrap_or(-1);
        debug!(
            "Process exited with code {} ({} bytes stdout, {} bytes stderr)",
            code,
            stdout.len(),
            stderr.len()
        );

        Ok(ProcessOutput {
            code,
            stdout,
            stderr,
        })
    }
}

/// Readers for the two output pipes. Aborted when dropped.
struct DrainTasks {
    stdout: JoinHandle<io::Result<Vec<u8>>>,
    stderr: JoinHandle<io::Result<Vec<u8>>>,
}

impl DrainTasks {
    fn spawn<O, E>(stdout: O, stderr: E) -> Self
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        Self {
            stdout: tokio::spawn(read_all(stdout)),
            stderr: tokio::spawn(read_all(stderr)),
        }
    }

    async fn join(&mut self, grace: Duration) -> Result<(String, String), ClaudeError> {
        let (stdout, stderr) = (&mut self.stdout, &mut self.stderr);
        let (stdout, stderr) = timeout(grace, async move { tokio::join!(stdout, stderr) })
            .await
            .map_err(|_| {
                ClaudeError::OutputReadError(format!(
                    "output streams were not closed within {}s of exit",
                    grace.as_secs()
                ))
            })?;

        Ok((collect("stdout", stdout)?, collect("stderr", stderr)?))
    }

    fn abort(&self) {
        self.stdout.abort();
        self.stderr.abort();
    }
}

impl Drop for DrainTasks {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

fn collect(
    stream: &str,
    joined: Result<io::Result<Vec<u8>>, JoinError>,
) -> Result<String, ClaudeError> {
    let bytes = joined
        .map_err(|e| ClaudeError::OutputReadError(format!("{stream} reader failed: {e}")))?
        .map_err(|e| ClaudeError::OutputReadError(format!("failed to read {stream}: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Run the Claude CLI with a prompt and return the generated text.
pub async fn run_claude(config: &ClaudeCliConfig, prompt: &str) -> Result<String, ClaudeError> {
    let output = CliInvocation::claude(config, prompt)?.run().await?;

    if !output.success() {
        return Err(ClaudeError::NonZeroExit {
            code: output.code,
            detail: output.failure_detail(),
        });
    }

    parse_response(&output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> CliInvocation {
        CliInvocation {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string()],
            timeout,
        }
    }

    #[test]
    fn test_build_args_without_model() {
        assert_eq!(
            build_args("Describe this", ""),
            vec!["-p", "--output-format", "json", "Describe this"]
        );
    }

    #[test]
    fn test_build_args_with_model() {
        assert_eq!(
            build_args("Describe this", "opus"),
            vec!["-p", "--output-format", "json", "--model", "opus", "Describe this"]
        );
    }

    #[test]
    fn test_blank_model_is_omitted() {
        assert!(!build_args("x", "   ").contains(&"--model".to_string()));
    }

    #[test]
    fn test_configured_path_that_does_not_exist() {
        let result = resolve_executable("/nonexistent/claude");
        match result {
            Err(ClaudeError::NotExecutable(path)) => {
                assert_eq!(path, PathBuf::from("/nonexistent/claude"))
            }
            other => panic!("Expected NotExecutable, got {:?}", other),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_configured_path_without_execute_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claude");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();

        let result = resolve_executable(path.to_str().unwrap());
        assert!(matches!(result, Err(ClaudeError::NotExecutable(_))));
    }

    #[test]
    #[cfg(unix)]
    fn test_configured_executable_is_used_verbatim() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my-claude");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(resolve_executable(path.to_str().unwrap()).unwrap(), path);
    }

    #[test]
    fn test_directory_is_not_executable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_executable(dir.path().to_str().unwrap()),
            Err(ClaudeError::NotExecutable(_))
        ));
    }

    #[test]
    fn test_failure_detail_prefers_stderr() {
        let output = ProcessOutput {
            code: 1,
            stdout: "out".to_string(),
            stderr: " err \n".to_string(),
        };
        assert_eq!(output.failure_detail(), "err");

        let output = ProcessOutput {
            stderr: "  ".to_string(),
            ..output
        };
        assert_eq!(output.failure_detail(), "out");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_captures_both_streams() {
        let output = sh("echo 'stdout content'; echo 'stderr content' >&2", Duration::from_secs(5))
            .run()
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, "stdout content\n");
        assert_eq!(output.stderr, "stderr content\n");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_reports_exit_code() {
        let output = sh("exit 42", Duration::from_secs(5)).run().await.unwrap();
        assert_eq!(output.code, 42);
        assert!(!output.success());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_signal_exit_is_minus_one() {
        let output = sh("kill -9 $$", Duration::from_secs(5)).run().await.unwrap();
        assert_eq!(output.code, -1);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_times_out() {
        let started = std::time::Instant::now();
        let result = sh("sleep 10", Duration::from_millis(200)).run().await;

        assert!(matches!(result, Err(ClaudeError::Timeout(0))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_non_utf8_output_is_lossy() {
        let output = sh("printf 'valid\\xFFtext'", Duration::from_secs(5))
            .run()
            .await
            .unwrap();

        assert!(output.stdout.contains("valid"));
        assert!(output.stdout.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let invocation = CliInvocation {
            program: PathBuf::from("nonexistent_command_12345"),
            args: Vec::new(),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(
            invocation.run().await,
            Err(ClaudeError::SpawnFailed(_))
        ));
    }
}
