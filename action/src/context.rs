//! Per-run context threaded through every phase step.
//!
//! Holds the collaborators (runner, store, console) together with the run's
//! own bookkeeping: status map, state snapshot and warning counter.

use tracing::{debug, warn};

use crate::core::ledger::{StatusMap, WarningCounter, warning_advisory};
use crate::core::snapshot::Snapshot;
use crate::core::types::{CommandSpec, ExecutionResult};
use crate::error::Result;
use crate::io::console::{Console, show_warning};
use crate::io::process::{ProcessRunner, execute};
use crate::io::state_store::{self, StateStore, WARNINGS_KEY};

pub struct RunContext<'a, R: ?Sized, S: ?Sized, C: ?Sized> {
    pub runner: &'a R,
    pub store: &'a mut S,
    pub console: &'a mut C,
    status: StatusMap,
    states: Snapshot,
    warnings: WarningCounter,
    /// Count persisted by earlier phases when this run started.
    earlier_warnings: u32,
}

impl<'a, R, S, C> RunContext<'a, R, S, C>
where
    R: ProcessRunner + ?Sized,
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    pub fn new(runner: &'a R, store: &'a mut S, console: &'a mut C) -> Self {
        let earlier_warnings = state_store::persisted_warnings(&*store);
        Self {
            runner,
            store,
            console,
            status: StatusMap::new(),
            states: Snapshot::new(),
            warnings: WarningCounter::new(),
            earlier_warnings,
        }
    }

    pub fn status(&self) -> &StatusMap {
        &self.status
    }

    pub fn states(&self) -> &Snapshot {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut Snapshot {
        &mut self.states
    }

    /// Warnings raised during this run only.
    pub fn warnings(&self) -> u32 {
        self.warnings.count()
    }

    /// Warnings persisted by earlier phases before this run started.
    pub fn earlier_warnings(&self) -> u32 {
        self.earlier_warnings
    }

    /// Run a command with its own failure policy, see [`execute`].
    pub fn execute(&mut self, spec: &CommandSpec) -> Result<ExecutionResult> {
        execute(self.runner, &mut *self.console, spec)
    }

    /// Run a command and record its exit code under `name`.
    ///
    /// A required command that fails is still recorded before the error
    /// propagates, so the finalizer shows which step stopped the run.
    pub fn execute_recorded(
        &mut self,
        name: &str,
        spec: &CommandSpec,
    ) -> Result<ExecutionResult> {
        match self.execute(spec) {
            Ok(result) => {
                self.record_status(name, result.exit_code);
                Ok(result)
            }
            Err(err) => {
                if let Some(code) = err.exit_code() {
                    self.record_status(name, code);
                }
                Err(err)
            }
        }
    }

    /// Last write wins; entries are never removed during a run.
    pub fn record_status(&mut self, name: &str, exit_code: i32) {
        debug!(name, exit_code, "recording status");
        self.status.record(name, exit_code);
    }

    /// Replace the run's snapshot with the one stored by earlier phases.
    pub fn restore_state(&mut self) -> Result<&Snapshot> {
        self.states = state_store::restore_state(&*self.store, &mut *self.console)?;
        Ok(&self.states)
    }

    /// Like [`Self::restore_state`], tolerating a store nothing was saved to yet.
    pub fn restore_state_or_empty(&mut self) -> Result<&Snapshot> {
        self.states = state_store::restore_state_or_empty(&*self.store, &mut *self.console)?;
        Ok(&self.states)
    }

    /// Persist the run's snapshot for later phases.
    pub fn save_state(&mut self) -> Result<()> {
        state_store::save_state(&mut *self.store, &mut *self.console, &self.states)
    }

    /// Count an advisory, render it, and persist the job-wide total
    /// (earlier phases plus this run).
    ///
    /// Never fails: a count that cannot be persisted only costs later phases
    /// their view of it.
    pub fn record_warning(&mut self, message: &str) {
        let count = self.warnings.increment();
        show_warning(&mut *self.console, message);
        let total = self.earlier_warnings.saturating_add(count);
        if let Err(err) = self.store.set(WARNINGS_KEY, &total.to_string()) {
            warn!(err = %err, "failed to persist warning count");
        }
    }

    /// Emit the end-of-phase advisory, if there were any warnings.
    pub fn finalize_warnings(&mut self, phase: &str) {
        if let Some(advisory) = warning_advisory(self.warnings.count(), phase) {
            self.console.warning(&advisory);
        }
    }

    /// Consume the context, keeping only the run's bookkeeping.
    pub fn into_parts(self) -> (StatusMap, Snapshot, u32) {
        (self.status, self.states, self.warnings.count())
    }
}
