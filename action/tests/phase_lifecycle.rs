//! Phase lifecycle scenarios driven through scripted doubles.
//!
//! Covers the abort/finalize contract of the phase runner and a full
//! setup → request → cleanup sequence sharing one state store.

use review_action::context::RunContext;
use review_action::core::types::{CommandSpec, ExecutionResult};
use review_action::error::{ActionError, Result};
use review_action::io::config::ActionConfig;
use review_action::io::hosting::RepoRef;
use review_action::io::state_store::{MemoryStateStore, StateStore, WARNINGS_KEY};
use review_action::phase::{PhaseSpec, run_phase};
use review_action::test_support::{RecordingConsole, ScriptedRunner, launch_failure};
use review_action::{cleanup, request, setup};

fn test_phase() -> PhaseSpec {
    PhaseSpec {
        title: "Lifecycle Phase".to_string(),
        label: "lifecycle".to_string(),
        advisory_name: "\"Lifecycle\"".to_string(),
        failure_prefix: "Lifecycle failed.".to_string(),
    }
}

fn required_steps() -> Vec<(String, CommandSpec)> {
    (1..=5)
        .map(|n| {
            let name = format!("step{n}");
            let spec = CommandSpec::new("tool")
                .arg(format!("--step={n}"))
                .fail_with(format!("Step {n} failed"));
            (name, spec)
        })
        .collect()
}

#[test]
fn five_successful_steps_complete_in_order() {
    let runner = ScriptedRunner::exit_codes([0, 0, 0, 0, 0]);
    let mut store = MemoryStateStore::new();
    let mut console = RecordingConsole::default();
    let steps = required_steps();

    let outcome = run_phase(
        RunContext::new(&runner, &mut store, &mut console),
        &test_phase(),
        |ctx| {
            for (name, spec) in &steps {
                ctx.execute_recorded(name, spec)?;
            }
            Ok(())
        },
    );

    assert!(outcome.succeeded());
    let names: Vec<&str> = outcome.status.names().collect();
    assert_eq!(names, vec!["step1", "step2", "step3", "step4", "step5"]);
    assert!(outcome.status.iter().all(|(_, code)| code == 0));
    assert!(console.failures().is_empty());
}

#[test]
fn failing_third_step_aborts_and_is_still_logged() {
    let runner = ScriptedRunner::exit_codes([0, 0, 2, 0, 0]);
    let mut store = MemoryStateStore::new();
    let mut console = RecordingConsole::default();
    let steps = required_steps();

    let outcome = run_phase(
        RunContext::new(&runner, &mut store, &mut console),
        &test_phase(),
        |ctx| {
            for (name, spec) in &steps {
                ctx.execute_recorded(name, spec)?;
            }
            Ok(())
        },
    );

    assert_eq!(runner.invocations().len(), 3);
    assert_eq!(runner.remaining(), 2);
    assert_eq!(outcome.status.len(), 3);
    assert_eq!(outcome.status.get("step3"), Some(2));
    assert_eq!(outcome.failure.as_deref(), Some("Step 3 failed (2)."));
    assert_eq!(console.failures(), vec!["Lifecycle failed. Step 3 failed (2)."]);
    assert!(console.logged(r#"status: {"step1":0,"step2":0,"step3":2}"#));
}

#[test]
fn launch_failure_aborts_like_a_failed_step() {
    let runner = ScriptedRunner::new([
        Ok(ExecutionResult::exited(0)),
        launch_failure("tool"),
    ]);
    let mut store = MemoryStateStore::new();
    let mut console = RecordingConsole::default();
    let steps = required_steps();

    let outcome = run_phase(
        RunContext::new(&runner, &mut store, &mut console),
        &test_phase(),
        |ctx| {
            for (name, spec) in &steps {
                ctx.execute_recorded(name, spec)?;
            }
            Ok(())
        },
    );

    assert_eq!(outcome.status.len(), 1);
    assert!(
        outcome
            .failure
            .as_deref()
            .is_some_and(|msg| msg.starts_with("Unable to run tool"))
    );
}

#[test]
fn setup_request_cleanup_share_one_store() {
    let config = ActionConfig::default();
    let repo = RepoRef::parse("cs-course/project-alice").expect("repo");
    let mut store = MemoryStateStore::new();

    let setup_outcome = {
        let runner = ScriptedRunner::default();
        let mut console = RecordingConsole::default();
        setup::setup_review(
            RunContext::new(&runner, &mut store, &mut console),
            &config,
            &repo,
            "refs/tags/v3.2.1",
        )
    };
    assert!(setup_outcome.succeeded(), "{:?}", setup_outcome.failure);

    // Six required steps pass; the main method search finds two matches.
    let mut results: Vec<Result<ExecutionResult>> =
        (0..6).map(|_| Ok(ExecutionResult::exited(0))).collect();
    results.push(Ok(ExecutionResult::with_stdout(
        0,
        "Driver.java:5:public static void main(\nOther.java:7:public static void main(\n",
    )));
    results.push(Ok(ExecutionResult::with_stdout(1, "")));
    let runner = ScriptedRunner::new(results);
    let mut console = RecordingConsole::default();
    let request_outcome = request::request_review(
        RunContext::new(&runner, &mut store, &mut console),
        &config,
    );

    assert_eq!(runner.remaining(), 0);
    assert_eq!(request_outcome.states.get("version"), Some("v3.2.1"));
    assert_eq!(request_outcome.warnings, 1);
    assert_eq!(
        request_outcome.failure.as_deref(),
        Some(ActionError::NotImplemented.to_string().as_str())
    );
    let names: Vec<&str> = request_outcome.status.names().collect();
    assert_eq!(
        names,
        vec![
            "java",
            "javac",
            "mvn",
            "maven",
            "mainCompile",
            "listClasses",
            "mainMethods",
            "todoComments"
        ]
    );
    assert_eq!(
        console.groups(),
        vec![
            "Restoring state...",
            "Displaying environment setup...",
            "Updating Maven dependencies...",
            "Checking code for warnings...",
            request::CHECKS_GROUP,
            "Logging request status...",
        ]
    );
    assert_eq!(store.get(WARNINGS_KEY).as_deref(), Some("1"));

    let runner = ScriptedRunner::default();
    let mut console = RecordingConsole::default();
    let cleanup_outcome =
        cleanup::cleanup_review(RunContext::new(&runner, &mut store, &mut console));
    assert!(cleanup_outcome.succeeded());
    assert_eq!(cleanup_outcome.states.get("project"), Some("3"));
    assert!(console.logged("Warnings from earlier phases: 1"));
}

#[test]
fn failed_compile_stops_the_request_phase() {
    let config = ActionConfig::default();
    let mut store = MemoryStateStore::with_values([("keys", "[]")]);
    // java, javac, mvn, maven pass; the compile step fails.
    let runner = ScriptedRunner::exit_codes([0, 0, 0, 0, 1]);
    let mut console = RecordingConsole::default();

    let outcome = request::request_review(
        RunContext::new(&runner, &mut store, &mut console),
        &config,
    );

    assert_eq!(runner.invocations().len(), 5);
    assert_eq!(outcome.status.get("mainCompile"), Some(1));
    assert_eq!(
        outcome.failure.as_deref(),
        Some("Unable to compile code without warnings (1).")
    );
    assert_eq!(
        console.failures(),
        vec!["Code review request failed. Unable to compile code without warnings (1)."]
    );
    assert_eq!(console.open_groups(), 0);
}
