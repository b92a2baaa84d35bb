//! Phase runner with guaranteed finalization.
//!
//! A phase body may fail at any step. Whatever happens, the finalizer logs
//! the status and state maps and emits the warning advisory, and a failure
//! is reported exactly once.

use tracing::{info, instrument, warn};

use crate::context::RunContext;
use crate::core::ledger::StatusMap;
use crate::core::snapshot::Snapshot;
use crate::error::Result;
use crate::exit_codes;
use crate::io::console::{Console, show_error, show_title};
use crate::io::process::ProcessRunner;
use crate::io::state_store::StateStore;

/// Fixed text of one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSpec {
    /// Banner shown when the phase starts.
    pub title: String,
    /// Short label for the finalizer group, e.g. `setup`.
    pub label: String,
    /// Name used in the warning advisory.
    pub advisory_name: String,
    /// Prefix of the job failure message.
    pub failure_prefix: String,
}

/// Result of one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOutcome {
    /// Failure message, if the body failed.
    pub failure: Option<String>,
    pub status: StatusMap,
    pub states: Snapshot,
    pub warnings: u32,
}

impl PhaseOutcome {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn exit_code(&self) -> i32 {
        if self.succeeded() {
            exit_codes::OK
        } else {
            exit_codes::FAILED
        }
    }
}

/// Run `body` inside the phase frame.
///
/// On error the message is shown inside whatever group is open, that group
/// is closed, and the job is marked failed. The finalizer always runs.
#[instrument(skip_all, fields(phase = %spec.label))]
pub fn run_phase<'a, R, S, C, F>(
    mut ctx: RunContext<'a, R, S, C>,
    spec: &PhaseSpec,
    body: F,
) -> PhaseOutcome
where
    R: ProcessRunner + ?Sized,
    S: StateStore + ?Sized,
    C: Console + ?Sized,
    F: FnOnce(&mut RunContext<'a, R, S, C>) -> Result<()>,
{
    show_title(&mut *ctx.console, &spec.title);

    let failure = match body(&mut ctx) {
        Ok(()) => {
            info!("phase completed");
            None
        }
        Err(err) => {
            warn!(err = %err, "phase failed");
            let message = err.to_string();
            show_error(&mut *ctx.console, &format!("{message}\n"));
            ctx.console.end_group();
            ctx.console
                .set_failed(&format!("{} {message}", spec.failure_prefix));
            Some(message)
        }
    };

    ctx.console
        .start_group(&format!("Logging {} status...", spec.label));
    let status_line = format!("status: {}", ctx.status().to_json());
    let states_line = format!("states: {}", ctx.states().to_json());
    ctx.console.info(&status_line);
    ctx.console.info(&states_line);
    ctx.console.end_group();

    ctx.finalize_warnings(&spec.advisory_name);

    let (status, states, warnings) = ctx.into_parts();
    PhaseOutcome {
        failure,
        status,
        states,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CommandSpec;
    use crate::error::ActionError;
    use crate::io::state_store::MemoryStateStore;
    use crate::test_support::{ConsoleLine, RecordingConsole, ScriptedRunner};

    fn spec() -> PhaseSpec {
        PhaseSpec {
            title: "Test Phase".to_string(),
            label: "test".to_string(),
            advisory_name: "\"Test\"".to_string(),
            failure_prefix: "Test failed.".to_string(),
        }
    }

    #[test]
    fn successful_body_logs_status_and_states() {
        let runner = ScriptedRunner::exit_codes([0]);
        let mut store = MemoryStateStore::new();
        let mut console = RecordingConsole::default();
        let ctx = RunContext::new(&runner, &mut store, &mut console);

        let outcome = run_phase(ctx, &spec(), |ctx| {
            ctx.execute_recorded("echo", &CommandSpec::new("echo"))?;
            ctx.states_mut().insert("version", "v1.0.0");
            Ok(())
        });

        assert!(outcome.succeeded());
        assert_eq!(outcome.exit_code(), exit_codes::OK);
        assert!(console.logged(r#"status: {"echo":0}"#));
        assert!(console.logged(r#"states: {"version":"v1.0.0"}"#));
        assert!(console.failures().is_empty());
        assert_eq!(console.groups(), vec!["Logging test status..."]);
    }

    #[test]
    fn failing_body_closes_group_and_marks_failure() {
        let runner = ScriptedRunner::default();
        let mut store = MemoryStateStore::new();
        let mut console = RecordingConsole::default();
        let ctx = RunContext::new(&runner, &mut store, &mut console);

        let outcome = run_phase(ctx, &spec(), |ctx| {
            ctx.console.start_group("Doing work...");
            Err(ActionError::NotImplemented)
        });

        assert!(!outcome.succeeded());
        assert_eq!(outcome.exit_code(), exit_codes::FAILED);
        let failures = console.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("Test failed. This action is not yet implemented."));
        assert_eq!(console.open_groups(), 0);

        let error_at = console
            .lines
            .iter()
            .position(|line| matches!(line, ConsoleLine::Info(text) if text.starts_with("Error: ")))
            .expect("error line");
        assert_eq!(console.lines[error_at + 1], ConsoleLine::EndGroup);
    }

    #[test]
    fn finalizer_reports_warnings_even_on_failure() {
        let runner = ScriptedRunner::default();
        let mut store = MemoryStateStore::new();
        let mut console = RecordingConsole::default();
        let ctx = RunContext::new(&runner, &mut store, &mut console);

        let outcome = run_phase(ctx, &spec(), |ctx| {
            ctx.record_warning("first");
            Err(ActionError::NotImplemented)
        });

        assert_eq!(outcome.warnings, 1);
        assert_eq!(
            console.warnings(),
            vec!["There was 1 warning in the \"Test\" phase. View the run log for details."]
        );
    }
}
