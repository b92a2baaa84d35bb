//! The setup phase: derive project details from the release ref and save
//! them for the phases that follow.

use tracing::instrument;

use crate::context::RunContext;
use crate::core::project::{ProjectDetails, parse_project};
use crate::error::Result;
use crate::io::config::ActionConfig;
use crate::io::console::{Console, show_success};
use crate::io::hosting::RepoRef;
use crate::io::process::ProcessRunner;
use crate::io::state_store::StateStore;
use crate::phase::{PhaseOutcome, PhaseSpec, run_phase};

pub fn phase_spec() -> PhaseSpec {
    PhaseSpec {
        title: "Request Setup Phase".to_string(),
        label: "setup".to_string(),
        advisory_name: "\"Request Setup\"".to_string(),
        failure_prefix: "Code review setup failed.".to_string(),
    }
}

/// Run the whole setup phase, finalizer included.
pub fn setup_review<R, S, C>(
    ctx: RunContext<'_, R, S, C>,
    config: &ActionConfig,
    repo: &RepoRef,
    release: &str,
) -> PhaseOutcome
where
    R: ProcessRunner + ?Sized,
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    run_phase(ctx, &phase_spec(), |ctx| {
        setup_body(ctx, config, repo, release)
    })
}

#[instrument(skip_all, fields(release = %release))]
fn setup_body<R, S, C>(
    ctx: &mut RunContext<'_, R, S, C>,
    config: &ActionConfig,
    repo: &RepoRef,
    release: &str,
) -> Result<()>
where
    R: ProcessRunner + ?Sized,
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    ctx.restore_state_or_empty()?;

    ctx.console.start_group("Parsing project details...");
    ctx.console.info("");
    let details = parse_project(&repo.owner, &repo.repo, &config.test_dir, release)?;
    show_details(&mut *ctx.console, &details);
    ctx.console.info("");
    ctx.console.end_group();

    for (key, value) in details.state_entries() {
        ctx.states_mut().insert(key, value);
    }
    ctx.save_state()?;
    show_success(
        &mut *ctx.console,
        &format!("Saved project details for release {}.", details.version),
    );
    Ok(())
}

fn show_details<C: Console + ?Sized>(console: &mut C, details: &ProjectDetails) {
    console.info(&format!("Project version: {}", details.version));
    console.info(&format!("Project number:  {}", details.project));
    console.info(&format!("Project reviews: {}", details.reviews));
    console.info(&format!("Project patches: {}", details.patches));
}
