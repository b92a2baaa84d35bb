//! Shared deterministic types for command execution.
//!
//! These types describe what to run and what came back. They hold no handles
//! to processes or files.

use std::path::PathBuf;

/// A single external command invocation.
///
/// Arguments are passed to the process verbatim; nothing here is ever handed
/// to a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Logged as an info line before the process starts.
    pub title: Option<String>,
    /// When set, a non-zero exit code fails with `"{failure_message} ({code})."`.
    pub failure_message: Option<String>,
    /// Capture stdout instead of letting it stream to the log.
    pub capture_output: bool,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
            title: None,
            failure_message: None,
            capture_output: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture_output = true;
        self
    }

    /// `command arg1 arg2 ...`, for diagnostics only.
    pub fn display(&self) -> String {
        let mut out = self.command.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

/// Outcome of running one [`CommandSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Process exit code; `-1` if the process ended without one (signal).
    pub exit_code: i32,
    /// Captured stdout, present only when capture was requested.
    pub stdout: Option<String>,
    /// Captured bytes dropped after the output limit was reached.
    pub stdout_truncated: usize,
}

impl ExecutionResult {
    pub fn exited(exit_code: i32) -> Self {
        Self {
            exit_code,
            stdout: None,
            stdout_truncated: 0,
        }
    }

    pub fn with_stdout(exit_code: i32, stdout: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: Some(stdout.into()),
            stdout_truncated: 0,
        }
    }

    /// Mark `bytes` of captured output as dropped.
    pub fn truncated(mut self, bytes: usize) -> Self {
        self.stdout_truncated = bytes;
        self
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
