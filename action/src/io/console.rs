//! Job log output.
//!
//! Everything the operator sees goes through [`Console`]. The workflow
//! implementation writes GitHub workflow commands to stdout; developer
//! diagnostics go through `tracing` instead (see [`crate::logging`]).

use std::io::Write;

/// Sink for operator-facing log output.
pub trait Console {
    fn info(&mut self, text: &str);
    /// Warning annotation, shown in the run summary.
    fn warning(&mut self, text: &str);
    fn start_group(&mut self, title: &str);
    fn end_group(&mut self);
    /// Register a value that must be masked in all later output.
    fn set_secret(&mut self, secret: &str);
    /// Error annotation that marks the job as failed.
    fn set_failed(&mut self, message: &str);
}

/// Console writing GitHub workflow commands.
pub struct WorkflowConsole<W: Write> {
    out: W,
}

impl WorkflowConsole<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> WorkflowConsole<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn command(&mut self, name: &str, data: &str) {
        // The log is best effort; a closed stdout must not abort the phase.
        let _ = writeln!(self.out, "::{name}::{}", escape_data(data));
    }
}

impl<W: Write> Console for WorkflowConsole<W> {
    fn info(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    fn warning(&mut self, text: &str) {
        self.command("warning", text);
    }

    fn start_group(&mut self, title: &str) {
        self.command("group", title);
    }

    fn end_group(&mut self) {
        self.command("endgroup", "");
    }

    fn set_secret(&mut self, secret: &str) {
        if !secret.is_empty() {
            self.command("add-mask", secret);
        }
    }

    fn set_failed(&mut self, message: &str) {
        self.command("error", message);
    }
}

/// Escape workflow command data so it stays on one line.
pub fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Phase banner, preceded by a blank line.
pub fn show_title<C: Console + ?Sized>(console: &mut C, text: &str) {
    console.info(&format!("\n{text}"));
}

pub fn show_error<C: Console + ?Sized>(console: &mut C, text: &str) {
    console.info(&format!("Error: {text}"));
}

pub fn show_success<C: Console + ?Sized>(console: &mut C, text: &str) {
    console.info(&format!("Success: {text}"));
}

/// Render a warning line. Counting is the caller's job
/// (see [`crate::context::RunContext::record_warning`]).
pub fn show_warning<C: Console + ?Sized>(console: &mut C, text: &str) {
    console.info(&format!("Warning: {text}"));
}
