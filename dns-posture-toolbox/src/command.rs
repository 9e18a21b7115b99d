//! Sandboxed execution of external resolver programs.
//!
//! Only used by the zone-transfer probe. Program names come from
//! configuration and must be on the allow-list; arguments are passed as argv
//! (never through a shell), execution is time-boxed, and output is capped.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::{ToolboxError, ToolboxResult};

/// Default output cap per stream (8 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 8 * 1024 * 1024;

/// Default execution timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Captured result of a finished program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Capability to run an external program.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> ToolboxResult<CommandOutput>;
}

/// [`CommandRunner`] enforcing an allow-list, a timeout and an output cap.
#[derive(Debug, Clone)]
pub struct SandboxedCommandRunner {
    allowed_programs: Vec<String>,
    timeout: Duration,
    max_output_bytes: usize,
}

impl SandboxedCommandRunner {
    pub fn new(allowed_programs: Vec<String>, timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            allowed_programs,
            timeout,
            max_output_bytes,
        }
    }

    /// Reject anything that is not a bare, allow-listed program name.
    pub fn check_program(&self, program: &str) -> ToolboxResult<()> {
        let bare = !program.is_empty()
            && !program.contains(['/', '\\'])
            && !program.chars().any(char::is_whitespace);
        if bare && self.allowed_programs.iter().any(|p| p == program) {
            Ok(())
        } else {
            Err(ToolboxError::UnsafeCommand(format!(
                "program '{program}' is not on the allow-list"
            )))
        }
    }

    fn check_args(args: &[String]) -> ToolboxResult<()> {
        match args.iter().find(|arg| arg.chars().any(char::is_control)) {
            Some(arg) => Err(ToolboxError::UnsafeCommand(format!(
                "argument contains control characters: {arg:?}"
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CommandRunner for SandboxedCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> ToolboxResult<CommandOutput> {
        self.check_program(program)?;
        Self::check_args(args)?;

        log::debug!("[command] {program} {}", args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolboxError::CommandFailed(format!("failed to start {program}: {e}")))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let cap = self.max_output_bytes;

        // Dropping `child` on timeout kills the process (kill_on_drop).
        let work = async move {
            let streams = tokio::try_join!(read_capped(stdout, cap), read_capped(stderr, cap));
            let (out, err) = match streams {
                Ok(streams) => streams,
                Err(e) => {
                    let _ = child.kill().await;
                    return Err(e);
                }
            };
            let status = child
                .wait()
                .await
                .map_err(|e| ToolboxError::CommandFailed(format!("wait failed: {e}")))?;
            Ok::<_, ToolboxError>(CommandOutput {
                exit_code: status.code(),
                stdout: String::from_utf8_lossy(&out).into_owned(),
                stderr: String::from_utf8_lossy(&err).into_owned(),
            })
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(ToolboxError::CommandFailed(format!(
                "{program} timed out after {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }
}

/// Read a child stream, failing once it exceeds `cap` bytes.
async fn read_capped<R>(reader: Option<R>, cap: usize) -> ToolboxResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };
    let limit = u64::try_from(cap).unwrap_or(u64::MAX).saturating_add(1);
    let mut buf = Vec::new();
    reader
        .take(limit)
        .read_to_end(&mut buf)
        .await
        .map_err(|e| ToolboxError::CommandFailed(format!("failed to read output: {e}")))?;
    if buf.len() > cap {
        return Err(ToolboxError::CommandFailed(format!(
            "output exceeded {cap} bytes"
        )));
    }
    Ok(buf)
}
