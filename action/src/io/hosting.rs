//! Source-hosting REST API boundary.
//!
//! No HTTP client lives in this crate. Callers hand in an implementation of
//! [`HostingApi`]; this module only decides what a response means and how a
//! failure is worded.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{ActionError, Result};
use crate::io::console::Console;

/// Workflow whose release-triggered run must have passed.
pub const TEST_WORKFLOW: &str = "run-tests.yml";

/// A raw API response: HTTP status plus decoded JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self { status: 200, data }
    }

    /// Body of a `200` response; any other status is an error worded
    /// `"{status} exit code"`.
    pub fn ensure_ok(self) -> std::result::Result<Value, String> {
        if self.status != 200 {
            return Err(format!("{} exit code", self.status));
        }
        Ok(self.data)
    }
}

/// Repository coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse `owner/repo` (the `GITHUB_REPOSITORY` format).
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

/// Operations the action consumes from the hosting platform.
///
/// `Err` is reserved for transport failures; an HTTP error status comes back
/// as an [`ApiResponse`] so callers can word it.
pub trait HostingApi {
    fn get_release_by_tag(
        &self,
        repo: &RepoRef,
        tag: &str,
    ) -> std::result::Result<ApiResponse, String>;

    fn list_workflow_runs(
        &self,
        repo: &RepoRef,
        workflow_id: &str,
        event: &str,
    ) -> std::result::Result<ApiResponse, String>;

    fn list_pull_requests(
        &self,
        repo: &RepoRef,
        head: &str,
    ) -> std::result::Result<ApiResponse, String>;

    fn get_milestone(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> std::result::Result<ApiResponse, String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub run_number: u64,
    pub head_branch: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
}

impl WorkflowRun {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("completed")
            && self.conclusion.as_deref() == Some("success")
    }
}

#[derive(Debug, Deserialize)]
struct WorkflowRunList {
    workflow_runs: Vec<WorkflowRun>,
}

/// A release and the test run that validated it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseDetails {
    pub release: Value,
    pub workflow: WorkflowRun,
}

/// Check that `release` exists and that its release-triggered test run passed.
#[instrument(skip_all, fields(release = %release))]
pub fn verify_release<A, C>(
    api: &A,
    console: &mut C,
    repo: &RepoRef,
    release: &str,
) -> Result<ReleaseDetails>
where
    A: HostingApi + ?Sized,
    C: Console + ?Sized,
{
    console.start_group("Checking release details...");
    console.info("");
    let verified = fetch_and_verify(api, console, repo, release);
    console.info("");
    console.end_group();
    verified
}

fn fetch_and_verify<A, C>(
    api: &A,
    console: &mut C,
    repo: &RepoRef,
    release: &str,
) -> Result<ReleaseDetails>
where
    A: HostingApi + ?Sized,
    C: Console + ?Sized,
{
    console.info(&format!("Fetching release {release} from {}...", repo.repo));
    let release_data = api
        .get_release_by_tag(repo, release)
        .and_then(ApiResponse::ensure_ok)
        .map_err(|msg| {
            ActionError::Hosting(format!(
                "Unable to fetch release {release} ({}).",
                msg.to_lowercase()
            ))
        })?;
    debug!("release fetched");

    console.info("Getting workflow runs...");
    let workflow = find_release_run(api, console, repo, release).map_err(|msg| {
        ActionError::Hosting(format!(
            "Unable to verify release {release} ({}).",
            msg.to_lowercase()
        ))
    })?;

    Ok(ReleaseDetails {
        release: release_data,
        workflow,
    })
}

fn find_release_run<A, C>(
    api: &A,
    console: &mut C,
    repo: &RepoRef,
    release: &str,
) -> std::result::Result<WorkflowRun, String>
where
    A: HostingApi + ?Sized,
    C: Console + ?Sized,
{
    let data = api
        .list_workflow_runs(repo, TEST_WORKFLOW, "release")?
        .ensure_ok()?;
    let runs: WorkflowRunList =
        serde_json::from_value(data).map_err(|err| format!("Malformed workflow runs: {err}"))?;

    let branches: Vec<&str> = runs
        .workflow_runs
        .iter()
        .map(|run| run.head_branch.as_deref().unwrap_or(""))
        .collect();
    console.info(&format!(
        "Fetched {} workflow runs: {}",
        runs.workflow_runs.len(),
        branches.join(", ")
    ));

    let found = runs
        .workflow_runs
        .into_iter()
        .find(|run| run.head_branch.as_deref() == Some(release))
        .ok_or_else(|| "Workflow run not found".to_string())?;

    if !found.succeeded() {
        return Err(format!(
            "Run #{} ({}) not successful",
            found.run_number, found.id
        ));
    }
    Ok(found)
}
