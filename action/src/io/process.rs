//! Running external commands and classifying their exit codes.
//!
//! The [`ProcessRunner`] trait decouples phases from actual process
//! spawning. Tests use scripted runners that return predetermined exit codes
//! without spawning anything.

use std::io::Read;
use std::process::{Command, Stdio};

use tracing::{debug, error, instrument, warn};

use crate::core::types::{CommandSpec, ExecutionResult};
use crate::error::{ActionError, Result};
use crate::io::console::Console;

/// Abstraction over process execution.
///
/// Implementations must run the command to completion and report its exit
/// code. A non-zero exit is a normal result, not an error.
pub trait ProcessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult>;
}

/// Captured output kept per command unless configured otherwise.
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 100_000;

/// Runner that spawns real child processes.
///
/// stdout and stderr stream straight into the job log unless the `CommandSpec` asks
/// for stdout to be captured. Captured stdout is bounded by `output_limit_bytes`;
/// the rest is drained and counted as truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemRunner {
    output_limit_bytes: usize,
}

impl SystemRunner {
    pub fn new(output_limit_bytes: usize) -> Self {
        Self { output_limit_bytes }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_LIMIT_BYTES)
    }
}

impl ProcessRunner for SystemRunner {
    #[instrument(skip_all, fields(command = %spec.command))]
    fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args).stdin(Stdio::null());
        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }

        debug!(args = ?spec.args, cwd = ?spec.working_dir, "spawning child process");
        let launch_error = |source: std::io::Error| {
            error!(err = %source, "failed to spawn command");
            ActionError::Launch {
                command: spec.command.clone(),
                source,
            }
        };

        let result = if spec.capture_output {
            let mut child = cmd
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(launch_error)?;
            // Drain stdout before waiting so a full pipe cannot block the child.
            let read = match child.stdout.take() {
                Some(stdout) => read_stream_limited(stdout, self.output_limit_bytes),
                None => Ok((Vec::new(), 0)),
            };
            let status = child.wait().map_err(launch_error)?;
            let (stdout, truncated) = read.map_err(launch_error)?;
            if truncated > 0 {
                warn!(truncated, limit = self.output_limit_bytes, "captured output truncated");
            }
            ExecutionResult::with_stdout(exit_code(status), String::from_utf8_lossy(&stdout))
                .truncated(truncated)
        } else {
            let status = cmd.status().map_err(launch_error)?;
            ExecutionResult::exited(exit_code(status))
        };

        debug!(exit_code = result.exit_code, "command finished");
        Ok(result)
    }
}

/// Read everything from `reader`, keeping at most `limit` bytes.
///
/// Returns the kept bytes and the number of bytes dropped.
fn read_stream_limited<R: Read>(
    mut reader: R,
    limit: usize,
) -> std::io::Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        let keep = n.min(remaining);
        buf.extend_from_slice(&chunk[..keep]);
        truncated += n - keep;
    }

    Ok((buf, truncated))
}

fn exit_code(status: std::process::ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => {
            warn!("command terminated without an exit code");
            -1
        }
    }
}

/// Run `spec`, announcing its title first, and apply its failure policy.
///
/// Returns the result for any exit code unless `spec` carries a failure
/// message, in which case a non-zero code becomes [`ActionError::CommandFailed`].
/// Captured stdout is echoed to the console so it still shows up in the log.
pub fn execute<R, C>(runner: &R, console: &mut C, spec: &CommandSpec) -> Result<ExecutionResult>
where
    R: ProcessRunner + ?Sized,
    C: Console + ?Sized,
{
    if let Some(title) = &spec.title {
        console.info(&format!("\n{title}..."));
    }

    let result = runner.run(spec)?;

    if let Some(stdout) = &result.stdout {
        for line in stdout.lines() {
            console.info(line);
        }
    }
    if result.stdout_truncated > 0 {
        console.info(&format!(
            "[{} stdout truncated {} bytes]",
            spec.command, result.stdout_truncated
        ));
    }

    if let Some(message) = &spec.failure_message
        && !result.success()
    {
        warn!(command = %spec.display(), exit_code = result.exit_code, "required command failed");
        return Err(ActionError::CommandFailed {
            message: format!("{message} ({}).", result.exit_code),
            exit_code: result.exit_code,
        });
    }

    Ok(result)
}
