//! Code review request action.
//!
//! Each workflow step invokes one phase. Inputs arrive through the
//! environment variables the workflow runner sets for actions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use review_action::cleanup::cleanup_review;
use review_action::context::RunContext;
use review_action::exit_codes;
use review_action::io::config::load_config;
use review_action::io::console::{Console, WorkflowConsole};
use review_action::io::hosting::RepoRef;
use review_action::io::process::SystemRunner;
use review_action::io::state_store::ActionsStateStore;
use review_action::logging;
use review_action::request::request_review;
use review_action::setup::setup_review;

#[derive(Parser)]
#[command(
    name = "review-action",
    version,
    about = "Request code review for a project release"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Token for the hosting API; masked in the log.
    #[arg(long, global = true, env = "INPUT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// TOML config file; defaults apply when omitted.
    #[arg(long, global = true, env = "INPUT_CONFIG")]
    config: Option<PathBuf>,

    /// Release ref, e.g. `refs/tags/v1.2.0`.
    #[arg(long, global = true, env = "INPUT_RELEASE")]
    release: Option<String>,

    /// Ref that triggered the workflow; used when no release is given.
    #[arg(long, global = true, env = "GITHUB_REF", hide = true)]
    github_ref: Option<String>,

    /// Repository as `owner/repo`.
    #[arg(long, global = true, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Parse the release and save project details for later phases.
    Setup,
    /// Build and check the project, then request review.
    Request,
    /// Report state and warnings left by earlier phases.
    Cleanup,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILED);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    // Inputs that were not provided arrive as empty strings.
    let config_path = cli.config.filter(|path| !path.as_os_str().is_empty());
    let config = load_config(config_path.as_deref()).context("load action config")?;

    let mut console = WorkflowConsole::stdout();
    if let Some(token) = &cli.token {
        console.set_secret(token);
    }
    let runner = SystemRunner::new(config.output_limit_bytes);
    let mut store = ActionsStateStore::from_env();

    let outcome = match cli.command {
        Command::Setup => {
            let repo = cli
                .repository
                .as_deref()
                .and_then(RepoRef::parse)
                .context("GITHUB_REPOSITORY must name a repository as owner/repo")?;
            let release = cli
                .release
                .filter(|r| !r.is_empty())
                .or(cli.github_ref)
                .filter(|r| !r.is_empty())
                .context("no release given (set INPUT_RELEASE or GITHUB_REF)")?;
            let ctx = RunContext::new(&runner, &mut store, &mut console);
            setup_review(ctx, &config, &repo, &release)
        }
        Command::Request => {
            let ctx = RunContext::new(&runner, &mut store, &mut console);
            request_review(ctx, &config)
        }
        Command::Cleanup => {
            let ctx = RunContext::new(&runner, &mut store, &mut console);
            cleanup_review(ctx)
        }
    };
    Ok(outcome.exit_code())
}
