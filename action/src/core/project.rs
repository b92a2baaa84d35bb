//! Project release tags (`v<project>.<reviews>.<patches>`).

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ActionError, Result};

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v([1-4])\.(\d+)\.(\d+)$").unwrap());

/// Details derived from the repository and a release ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDetails {
    pub owner: String,
    /// `owner/repo`
    pub main_repo: String,
    /// `owner/<test dir>`
    pub test_repo: String,
    /// Project number, 1 through 4.
    pub project: u32,
    pub reviews: u32,
    pub patches: u32,
    /// The tag itself, e.g. `v1.2.0`.
    pub version: String,
}

impl ProjectDetails {
    /// Pairs to remember for later phases, in a stable order.
    pub fn state_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("owner", self.owner.clone()),
            ("main_repo", self.main_repo.clone()),
            ("test_repo", self.test_repo.clone()),
            ("version", self.version.clone()),
            ("project", self.project.to_string()),
            ("reviews", self.reviews.to_string()),
            ("patches", self.patches.to_string()),
        ]
    }
}

/// Parse a ref such as `refs/tags/v1.2.0` (only the last segment matters).
pub fn parse_project(
    owner: &str,
    repo: &str,
    test_dir: &str,
    git_ref: &str,
) -> Result<ProjectDetails> {
    let version = git_ref.rsplit('/').next().unwrap_or(git_ref);
    let invalid =
        || ActionError::Project(format!("Unable to parse project information from: {git_ref}"));

    let captures = VERSION_RE.captures(version).ok_or_else(invalid)?;
    let number = |idx: usize| -> Result<u32> {
        captures
            .get(idx)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or_else(invalid)
    };

    Ok(ProjectDetails {
        owner: owner.to_string(),
        main_repo: format!("{owner}/{repo}"),
        test_repo: format!("{owner}/{test_dir}"),
        project: number(1)?,
        reviews: number(2)?,
        patches: number(3)?,
        version: version.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_ref() {
        let details =
            parse_project("cs-course", "project-alice", "project-tests", "refs/tags/v2.1.3")
                .expect("parse");
        assert_eq!(details.project, 2);
        assert_eq!(details.reviews, 1);
        assert_eq!(details.patches, 3);
        assert_eq!(details.version, "v2.1.3");
        assert_eq!(details.main_repo, "cs-course/project-alice");
        assert_eq!(details.test_repo, "cs-course/project-tests");
    }

    #[test]
    fn parses_bare_tag() {
        let details = parse_project("o", "r", "t", "v1.0.0").expect("parse");
        assert_eq!(details.version, "v1.0.0");
    }

    #[test]
    fn rejects_project_out_of_range() {
        let err = parse_project("o", "r", "t", "refs/tags/v5.0.0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to parse project information from: refs/tags/v5.0.0"
        );
    }

    #[test]
    fn rejects_non_version_refs() {
        for git_ref in ["refs/heads/main", "v1.2", "v1.2.3-rc1", "1.2.3", ""] {
            assert!(
                parse_project("o", "r", "t", git_ref).is_err(),
                "expected error for {git_ref:?}"
            );
        }
    }

    #[test]
    fn state_entries_are_stringified() {
        let details = parse_project("o", "r", "t", "v3.4.5").expect("parse");
        let entries = details.state_entries();
        assert_eq!(entries[0], ("owner", "o".to_string()));
        assert!(entries.contains(&("project", "3".to_string())));
        assert!(entries.contains(&("patches", "5".to_string())));
    }
}
