//! Action configuration (TOML), passed through the `config` input.
//!
//! The command sequence of the request phase is data: each group becomes a
//! collapsible section in the log, each step one process invocation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::CommandSpec;
use crate::io::process::DEFAULT_OUTPUT_LIMIT_BYTES;

/// Placeholder replaced with [`ActionConfig::main_dir`] in args, dirs and paths.
pub const MAIN_DIR_PLACEHOLDER: &str = "{main_dir}";

/// Action configuration (TOML).
///
/// Missing fields default to the course's standard project layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ActionConfig {
    /// Checkout directory of the student's project repository.
    pub main_dir: String,

    /// Name of the shared test repository (must match `pom.xml`).
    pub test_dir: String,

    /// Phase name used in the end-of-run warning advisory.
    pub phase_name: String,

    /// Must-succeed command groups, run in order.
    pub groups: Vec<GroupConfig>,

    /// Code searches compared against an expected match count.
    pub checks: Vec<CheckConfig>,

    /// Bytes of captured command output kept per command.
    pub output_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct GroupConfig {
    /// Log group title, e.g. `Updating Maven dependencies...`.
    pub title: String,
    pub steps: Vec<StepConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct StepConfig {
    /// Status map key for this step.
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    /// Announced before the command runs.
    pub title: Option<String>,
    /// Failure message; when absent a non-zero exit code is only recorded.
    pub error: Option<String>,
    /// Working directory.
    pub chdir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CheckConfig {
    /// Status map key for this search.
    pub name: String,
    pub title: String,
    /// Extended regular expression handed to `grep -E`.
    pub pattern: String,
    /// File or directory searched recursively.
    pub path: String,
    /// Expected number of matching lines.
    pub expected: usize,
    /// Warning shown when the count differs.
    pub warning: String,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            main_dir: "project-main".to_string(),
            test_dir: "project-tests".to_string(),
            phase_name: "\"Request Review\"".to_string(),
            groups: default_groups(),
            checks: default_checks(),
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

fn step(name: &str, command: &str, args: &[&str]) -> StepConfig {
    StepConfig {
        name: name.to_string(),
        command: command.to_string(),
        args: args.iter().map(|arg| arg.to_string()).collect(),
        ..StepConfig::default()
    }
}

fn default_groups() -> Vec<GroupConfig> {
    vec![
        GroupConfig {
            title: "Displaying environment setup...".to_string(),
            steps: vec![
                StepConfig {
                    title: Some("Displaying Java runtime version".to_string()),
                    error: Some("Unable to display Java runtime version".to_string()),
                    ..step("java", "java", &["--version"])
                },
                StepConfig {
                    title: Some("Displaying Java compiler version".to_string()),
                    error: Some("Unable to display Java compiler version".to_string()),
                    ..step("javac", "javac", &["--version"])
                },
                StepConfig {
                    title: Some("Displaying Maven version".to_string()),
                    error: Some("Unable to display Maven version".to_string()),
                    ..step("mvn", "mvn", &["--version"])
                },
            ],
        },
        GroupConfig {
            title: "Updating Maven dependencies...".to_string(),
            steps: vec![StepConfig {
                error: Some("Updating returned non-zero exit code".to_string()),
                ..step(
                    "maven",
                    "mvn",
                    &["-f", "{main_dir}/pom.xml", "-ntp", "dependency:go-offline"],
                )
            }],
        },
        GroupConfig {
            title: "Checking code for warnings...".to_string(),
            steps: vec![
                StepConfig {
                    title: Some("Compiling project code".to_string()),
                    error: Some("Unable to compile code without warnings".to_string()),
                    chdir: Some("{main_dir}/".to_string()),
                    ..step(
                        "mainCompile",
                        "mvn",
                        &[
                            "-ntp",
                            "-DcompileOptionXlint=-Xlint:all",
                            "-DcompileOptionXdoclint=-Xdoclint:all/private",
                            "-DcompileOptionFail=true",
                            "-Dmaven.compiler.showWarnings=true",
                            "clean",
                            "compile",
                        ],
                    )
                },
                StepConfig {
                    title: Some("Listing main class files".to_string()),
                    error: Some("Unable to list main class directory".to_string()),
                    ..step("listClasses", "ls", &["-m", "{main_dir}/target/classes"])
                },
            ],
        },
    ]
}

fn default_checks() -> Vec<CheckConfig> {
    vec![
        CheckConfig {
            name: "mainMethods".to_string(),
            title: "Checking for main methods".to_string(),
            pattern: r"public\s+static\s+void\s+main\s*\(".to_string(),
            path: "{main_dir}/src/main/java".to_string(),
            expected: 1,
            warning: "Found an unexpected number of main methods. Only the Driver class may \
                      declare one."
                .to_string(),
        },
        CheckConfig {
            name: "todoComments".to_string(),
            title: "Checking for TODO comments".to_string(),
            pattern: r"//\s*TODO".to_string(),
            path: "{main_dir}/src/main/java".to_string(),
            expected: 0,
            warning: "Found TODO comments. Resolve and remove them before requesting review."
                .to_string(),
        },
    ]
}

impl ActionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.main_dir.trim().is_empty() {
            return Err(anyhow!("main_dir must be non-empty"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        for group in &self.groups {
            if group.steps.is_empty() {
                return Err(anyhow!(
                    "group '{}' must contain at least one step",
                    group.title
                ));
            }
            for step in &group.steps {
                if step.name.trim().is_empty() {
                    return Err(anyhow!("step in group '{}' must have a name", group.title));
                }
                if step.command.trim().is_empty() {
                    return Err(anyhow!("step '{}' must have a command", step.name));
                }
            }
        }
        for check in &self.checks {
            if check.name.trim().is_empty() {
                return Err(anyhow!("check must have a name"));
            }
            if check.pattern.is_empty() || check.path.trim().is_empty() {
                return Err(anyhow!("check '{}' needs a pattern and a path", check.name));
            }
        }
        Ok(())
    }

    /// Replace the `{main_dir}` placeholder.
    pub fn resolve(&self, raw: &str) -> String {
        raw.replace(MAIN_DIR_PLACEHOLDER, &self.main_dir)
    }

    /// Command spec for a configured step, placeholders resolved.
    pub fn step_spec(&self, step: &StepConfig) -> CommandSpec {
        let mut spec =
            CommandSpec::new(&step.command).args(step.args.iter().map(|arg| self.resolve(arg)));
        if let Some(title) = &step.title {
            spec = spec.title(title);
        }
        if let Some(error) = &step.error {
            spec = spec.fail_with(error);
        }
        if let Some(dir) = &step.chdir {
            spec = spec.working_dir(self.resolve(dir));
        }
        spec
    }

    /// `grep` invocation for a check. Never fails on its own exit code.
    pub fn check_spec(&self, check: &CheckConfig) -> CommandSpec {
        CommandSpec::new("grep")
            .args(["-r", "-n", "-E", "--include=*.java", "-e"])
            .arg(&check.pattern)
            .arg(self.resolve(&check.path))
            .title(&check.title)
            .capture()
    }
}

/// Load config from a TOML file.
///
/// If `path` is `None`, returns `ActionConfig::default()`.
pub fn load_config(path: Option<&Path>) -> Result<ActionConfig> {
    let Some(path) = path else {
        let cfg = ActionConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    };
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ActionConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_returns_default() {
        let cfg = load_config(None).expect("load");
        assert_eq!(cfg, ActionConfig::default());
        assert_eq!(cfg.groups.len(), 3);
        assert_eq!(cfg.checks.len(), 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = load_config(Some(&temp.path().join("missing.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("action.toml");
        fs::write(&path, "main_dir = \"project-alice\"\n").expect("write");

        let cfg = load_config(Some(&path)).expect("load");
        assert_eq!(cfg.main_dir, "project-alice");
        assert_eq!(cfg.test_dir, "project-tests");
        assert_eq!(cfg.groups, default_groups());
    }

    #[test]
    fn custom_groups_replace_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("action.toml");
        fs::write(
            &path,
            r#"
checks = []

[[groups]]
title = "Only group"

[[groups.steps]]
name = "echo"
command = "echo"
args = ["{main_dir}"]
error = "Echo failed"
"#,
        )
        .expect("write");

        let cfg = load_config(Some(&path)).expect("load");
        assert_eq!(cfg.groups.len(), 1);
        assert!(cfg.checks.is_empty());
        let spec = cfg.step_spec(&cfg.groups[0].steps[0]);
        assert_eq!(spec.args, vec!["project-main"]);
        assert_eq!(spec.failure_message.as_deref(), Some("Echo failed"));
    }

    #[test]
    fn validate_rejects_nameless_steps() {
        let mut cfg = ActionConfig::default();
        cfg.groups[0].steps[0].name = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_output_limit() {
        let cfg = ActionConfig {
            output_limit_bytes: 0,
            ..ActionConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("output_limit_bytes"));
    }

    #[test]
    fn validate_rejects_empty_groups() {
        let mut cfg = ActionConfig::default();
        cfg.groups[1].steps.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn step_spec_resolves_main_dir() {
        let cfg = ActionConfig {
            main_dir: "project-bob".to_string(),
            ..ActionConfig::default()
        };
        let compile = &cfg.groups[2].steps[0];
        let spec = cfg.step_spec(compile);
        assert_eq!(
            spec.working_dir.as_deref(),
            Some(Path::new("project-bob/"))
        );
        assert_eq!(spec.title.as_deref(), Some("Compiling project code"));

        let maven = cfg.step_spec(&cfg.groups[1].steps[0]);
        assert_eq!(maven.args[1], "project-bob/pom.xml");
    }

    #[test]
    fn check_spec_captures_and_never_fails() {
        let cfg = ActionConfig::default();
        let spec = cfg.check_spec(&cfg.checks[0]);
        assert_eq!(spec.command, "grep");
        assert!(spec.capture_output);
        assert!(spec.failure_message.is_none());
        assert_eq!(
            spec.args.last().map(String::as_str),
            Some("project-main/src/main/java")
        );
    }
}
