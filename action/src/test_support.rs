//! Test-only doubles for the process runner and the console.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::core::types::{CommandSpec, ExecutionResult};
use crate::error::{ActionError, Result};
use crate::io::console::Console;
use crate::io::process::ProcessRunner;

/// Runner that replays queued results in order and records every spec.
///
/// Running past the end of the queue reports exit code 0.
#[derive(Default)]
pub struct ScriptedRunner {
    queue: RefCell<VecDeque<Result<ExecutionResult>>>,
    invocations: RefCell<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new<I>(results: I) -> Self
    where
        I: IntoIterator<Item = Result<ExecutionResult>>,
    {
        Self {
            queue: RefCell::new(results.into_iter().collect()),
            invocations: RefCell::new(Vec::new()),
        }
    }

    /// Queue plain exit codes without captured output.
    pub fn exit_codes<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        Self::new(codes.into_iter().map(|code| Ok(ExecutionResult::exited(code))))
    }

    /// Specs seen so far, in call order.
    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        self.invocations.borrow_mut().push(spec.clone());
        match self.queue.borrow_mut().pop_front() {
            Some(result) => result,
            None => Ok(ExecutionResult::exited(0)),
        }
    }
}

/// Launch failure for a scripted runner queue.
pub fn launch_failure(command: &str) -> Result<ExecutionResult> {
    Err(ActionError::Launch {
        command: command.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
    })
}

/// One console call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Info(String),
    Warning(String),
    StartGroup(String),
    EndGroup,
    Secret(String),
    Failed(String),
}

/// Console that records calls instead of printing them.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    pub lines: Vec<ConsoleLine>,
}

impl RecordingConsole {
    pub fn info_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                ConsoleLine::Info(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                ConsoleLine::Warning(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                ConsoleLine::Failed(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn groups(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                ConsoleLine::StartGroup(title) => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    /// Groups started but not yet ended (never below zero).
    pub fn open_groups(&self) -> usize {
        self.lines.iter().fold(0usize, |open, line| match line {
            ConsoleLine::StartGroup(_) => open + 1,
            ConsoleLine::EndGroup => open.saturating_sub(1),
            _ => open,
        })
    }

    /// True if any info line contains `needle`.
    pub fn logged(&self, needle: &str) -> bool {
        self.info_lines().iter().any(|line| line.contains(needle))
    }
}

impl Console for RecordingConsole {
    fn info(&mut self, text: &str) {
        self.lines.push(ConsoleLine::Info(text.to_string()));
    }

    fn warning(&mut self, text: &str) {
        self.lines.push(ConsoleLine::Warning(text.to_string()));
    }

    fn start_group(&mut self, title: &str) {
        self.lines.push(ConsoleLine::StartGroup(title.to_string()));
    }

    fn end_group(&mut self) {
        self.lines.push(ConsoleLine::EndGroup);
    }

    fn set_secret(&mut self, secret: &str) {
        self.lines.push(ConsoleLine::Secret(secret.to_string()));
    }

    fn set_failed(&mut self, message: &str) {
        self.lines.push(ConsoleLine::Failed(message.to_string()));
    }
}
