//! Sandbox - Run exactly one process, no shell
//!
//! The executor spawns the executable directly with a cleared environment
//! (only a fixed `PATH`), stdin closed, and the workspace root as working
//! directory. Stdout and stderr are drained concurrently into independent
//! capped buffers so an oversized stream never blocks the child. Process
//! exit races a timer; whichever fires first decides the outcome.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The only environment variable a child sees
pub const SANDBOX_PATH: &str = "/usr/bin:/bin";

/// Exit code reported when the timer wins
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported when the process could not be spawned, or was killed
/// by a signal
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// How long to wait for the output readers once the process is gone
const READER_GRACE: Duration = Duration::from_secs(2);

const CHUNK_SIZE: usize = 8 * 1024;

/// One execution request
#[derive(Debug, Clone)]
pub struct ExecRequest {
    /// Absolute executable path
    pub executable: PathBuf,
    /// Argument vector
    pub args: Vec<String>,
    /// Working directory (the workspace root)
    pub working_dir: PathBuf,
    /// Wall-clock limit
    pub timeout: Duration,
    /// Stdout cap in bytes
    pub max_stdout_bytes: usize,
    /// Stderr cap in bytes
    pub max_stderr_bytes: usize,
}

/// Outcome of one execution, produced once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecOutput {
    /// Exit code (or a sentinel)
    pub exit_code: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Stdout exceeded its cap
    pub stdout_truncated: bool,
    /// Stderr exceeded its cap
    pub stderr_truncated: bool,
    /// The timer fired first and the process was killed
    pub did_timeout: bool,
}

impl ExecOutput {
    /// Exited 0 without timing out
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && !self.did_timeout
    }

    fn spawn_failure(message: String) -> Self {
        Self {
            exit_code: SPAWN_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: message,
            stdout_truncated: false,
            stderr_truncated: false,
            did_timeout: false,
        }
    }
}

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Read `stream` to EOF, keeping at most `cap` bytes.
async fn capture<R>(mut stream: R, cap: usize) -> Captured
where
    R: AsyncRead + Unpin,
{
    let mut captured = Captured::default();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let room = cap.saturating_sub(captured.bytes.len());
                if n > room {
                    captured.truncated = true;
                }
                captured.bytes.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) => {
                debug!(error = %e, "Output stream closed with error");
                break;
            }
        }
    }
    captured
}

async fn collect(handle: Option<JoinHandle<Captured>>) -> Captured {
    let Some(mut handle) = handle else {
        return Captured::default();
    };
    match tokio::time::timeout(READER_GRACE, &mut handle).await {
        Ok(Ok(captured)) => captured,
        Ok(Err(e)) => {
            warn!(error = %e, "Output reader failed");
            Captured::default()
        }
        Err(_) => {
            // A grandchild may still hold the pipe open.
            handle.abort();
            warn!("Output reader did not finish after process exit");
            Captured {
                bytes: Vec::new(),
                truncated: true,
            }
        }
    }
}

/// Sandboxed Executor
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxedExecutor;

impl SandboxedExecutor {
    /// Create a new executor
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run one process.
    ///
    /// Returns `Err` only for a request that is rejected before spawning (a
    /// non-absolute executable). Spawn failures, non-zero exits and timeouts
    /// are all reported through [`ExecOutput`].
    pub async fn run(&self, request: &ExecRequest) -> Result<ExecOutput> {
        if !request.executable.is_absolute() {
            return Err(Error::InvalidInput(format!(
                "executable '{}' is not an absolute path",
                request.executable.display()
            )));
        }

        let mut cmd = Command::new(&request.executable);
        cmd.args(&request.args)
            .current_dir(&request.working_dir)
            .env_clear()
            .env("PATH", SANDBOX_PATH)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(
                    executable = %request.executable.display(),
                    error = %e,
                    "Failed to spawn process"
                );
                return Ok(ExecOutput::spawn_failure(format!(
                    "failed to spawn '{}': {}",
                    request.executable.display(),
                    e
                )));
            }
        };

        let stdout_cap = request.max_stdout_bytes;
        let stderr_cap = request.max_stderr_bytes;
        let stdout_reader = child
            .stdout
            .take()
            .map(|s| tokio::spawn(capture(s, stdout_cap)));
        let stderr_reader = child
            .stderr
            .take()
            .map(|s| tokio::spawn(capture(s, stderr_cap)));

        let (exit_code, did_timeout) = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => (status.code().unwrap_or(SPAWN_FAILURE_EXIT_CODE), false),
                Err(e) => {
                    warn!(error = %e, "Failed to wait for process");
                    (SPAWN_FAILURE_EXIT_CODE, false)
                }
            },
            _ = tokio::time::sleep(request.timeout) => {
                warn!(
                    executable = %request.executable.display(),
                    timeout_secs = request.timeout.as_secs(),
                    "Process timed out, killing"
                );
                if let Err(e) = child.start_kill() {
                    warn!(error = %e, "Failed to signal timed-out process");
                }
                if let Err(e) = child.wait().await {
                    warn!(error = %e, "Failed to reap timed-out process");
                }
                (TIMEOUT_EXIT_CODE, true)
            }
        };

        let stdout = collect(stdout_reader).await;
        let stderr = collect(stderr_reader).await;

        debug!(
            executable = %request.executable.display(),
            exit_code,
            did_timeout,
            stdout_bytes = stdout.bytes.len(),
            stderr_bytes = stderr.bytes.len(),
            "Process finished"
        );

        Ok(ExecOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout.bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.bytes).into_owned(),
            stdout_truncated: stdout.truncated,
            stderr_truncated: stderr.truncated,
            did_timeout,
        })
    }
}
