//! In-run bookkeeping: step exit codes and the warning counter.
//!
//! Both are owned by a single run and never shared across threads. The
//! counter survives across phases only through the state store, see
//! [`crate::io::state_store::WARNINGS_KEY`].

use indexmap::IndexMap;
use serde::Serialize;

/// Step name → exit code, in the order steps were first recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusMap(IndexMap<String, i32>);

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `exit_code` under `name`. Re-recording a name overwrites the code
    /// but keeps its original position.
    pub fn record(&mut self, name: impl Into<String>, exit_code: i32) {
        self.0.insert(name.into(), exit_code);
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(name, code)| (name.as_str(), *code))
    }

    /// Compact JSON object, e.g. `{"maven":0,"mainCompile":1}`.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Monotonic count of advisories raised during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarningCounter(u32);

impl WarningCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the new count.
    pub fn increment(&mut self) -> u32 {
        self.0 = self.0.saturating_add(1);
        self.0
    }

    pub fn count(&self) -> u32 {
        self.0
    }
}

/// End-of-phase advisory for `count` warnings, or `None` when there were none.
///
/// The wording changes between exactly one and more than one warning.
pub fn warning_advisory(count: u32, phase: &str) -> Option<String> {
    match count {
        0 => None,
        1 => Some(format!(
            "There was 1 warning in the {phase} phase. View the run log for details."
        )),
        n => Some(format!(
            "There were {n} warnings in the {phase} phase. View the run log for details."
        )),
    }
}
