//! The request-review phase.
//!
//! Restores state, runs the configured must-succeed groups, compares the
//! code checks against their baselines, then stops: opening the review pull
//! request is not implemented yet.

use tracing::{debug, instrument};

use crate::context::RunContext;
use crate::core::baseline::{self, BaselineOutcome};
use crate::error::{ActionError, Result};
use crate::io::config::{ActionConfig, CheckConfig, GroupConfig};
use crate::io::console::Console;
use crate::io::process::ProcessRunner;
use crate::io::state_store::StateStore;
use crate::phase::{PhaseOutcome, PhaseSpec, run_phase};

pub const CHECKS_GROUP: &str = "Checking code for advisories...";

pub fn phase_spec(config: &ActionConfig) -> PhaseSpec {
    PhaseSpec {
        title: "Request Review Phase".to_string(),
        label: "request".to_string(),
        advisory_name: config.phase_name.clone(),
        failure_prefix: "Code review request failed.".to_string(),
    }
}

/// Run the whole request phase, finalizer included.
pub fn request_review<R, S, C>(ctx: RunContext<'_, R, S, C>, config: &ActionConfig) -> PhaseOutcome
where
    R: ProcessRunner + ?Sized,
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    run_phase(ctx, &phase_spec(config), |ctx| review_body(ctx, config))
}

#[instrument(skip_all)]
fn review_body<R, S, C>(ctx: &mut RunContext<'_, R, S, C>, config: &ActionConfig) -> Result<()>
where
    R: ProcessRunner + ?Sized,
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    ctx.restore_state()?;

    for group in &config.groups {
        run_group(ctx, config, group)?;
    }

    if !config.checks.is_empty() {
        ctx.console.start_group(CHECKS_GROUP);
        for check in &config.checks {
            run_check(ctx, config, check)?;
        }
        ctx.console.info("");
        ctx.console.end_group();
    }

    // pushing the review branch and opening the pull request come next
    Err(ActionError::NotImplemented)
}

/// Run every step of a group in order. The first failing step aborts and
/// leaves the group open for the phase runner to close.
fn run_group<R, S, C>(
    ctx: &mut RunContext<'_, R, S, C>,
    config: &ActionConfig,
    group: &GroupConfig,
) -> Result<()>
where
    R: ProcessRunner + ?Sized,
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    ctx.console.start_group(&group.title);
    for step in &group.steps {
        ctx.execute_recorded(&step.name, &config.step_spec(step))?;
    }
    ctx.console.info("");
    ctx.console.end_group();
    Ok(())
}

fn run_check<R, S, C>(
    ctx: &mut RunContext<'_, R, S, C>,
    config: &ActionConfig,
    check: &CheckConfig,
) -> Result<()>
where
    R: ProcessRunner + ?Sized,
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    let result = ctx.execute_recorded(&check.name, &config.check_spec(check))?;
    let outcome = baseline::evaluate(result.exit_code, result.stdout.as_deref(), check.expected);
    debug!(check = %check.name, ?outcome, "baseline compared");

    match outcome {
        BaselineOutcome::Matches => {
            ctx.console
                .info(&format!("Found {} matching lines as expected.", check.expected));
        }
        BaselineOutcome::Mismatch { found, expected } => {
            ctx.record_warning(&format!(
                "{} (found {found}, expected {expected})",
                check.warning
            ));
        }
        BaselineOutcome::SearchFailed { exit_code } => {
            ctx.record_warning(&format!(
                "Unable to search {} for {} ({exit_code}).",
                config.resolve(&check.path),
                check.name
            ));
        }
    }
    Ok(())
}
