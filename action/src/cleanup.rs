//! The cleanup phase: report what earlier phases left behind.

use crate::context::RunContext;
use crate::error::Result;
use crate::io::console::Console;
use crate::io::process::ProcessRunner;
use crate::io::state_store::StateStore;
use crate::phase::{PhaseOutcome, PhaseSpec, run_phase};

pub fn phase_spec() -> PhaseSpec {
    PhaseSpec {
        title: "Request Cleanup Phase".to_string(),
        label: "cleanup".to_string(),
        advisory_name: "\"Request Cleanup\"".to_string(),
        failure_prefix: "Code review cleanup failed.".to_string(),
    }
}

pub fn cleanup_review<R, S, C>(ctx: RunContext<'_, R, S, C>) -> PhaseOutcome
where
    R: ProcessRunner + ?Sized,
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    run_phase(ctx, &phase_spec(), cleanup_body)
}

fn cleanup_body<R, S, C>(ctx: &mut RunContext<'_, R, S, C>) -> Result<()>
where
    R: ProcessRunner + ?Sized,
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    ctx.restore_state()?;
    let earlier = ctx.earlier_warnings();
    ctx.console
        .info(&format!("Warnings from earlier phases: {earlier}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::state_store::MemoryStateStore;
    use crate::test_support::{RecordingConsole, ScriptedRunner};

    #[test]
    fn reports_restored_state_and_earlier_warnings() {
        let runner = ScriptedRunner::default();
        let mut store = MemoryStateStore::with_values([
            ("keys", r#"["version"]"#),
            ("version", "v1.2.0"),
            ("warnings", "3"),
        ]);
        let mut console = RecordingConsole::default();

        let outcome = cleanup_review(RunContext::new(&runner, &mut store, &mut console));

        assert!(outcome.succeeded());
        assert_eq!(outcome.warnings, 0);
        assert!(console.logged("Warnings from earlier phases: 3"));
        assert!(console.logged(r#"states: {"version":"v1.2.0"}"#));
        assert!(console.warnings().is_empty());
    }

    #[test]
    fn missing_state_fails() {
        let runner = ScriptedRunner::default();
        let mut store = MemoryStateStore::new();
        let mut console = RecordingConsole::default();

        let outcome = cleanup_review(RunContext::new(&runner, &mut store, &mut console));

        assert!(!outcome.succeeded());
        assert!(console.failures()[0].starts_with("Code review cleanup failed. Unable to restore"));
    }
}
