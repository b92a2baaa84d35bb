//! Job-scoped key/value store shared between phases.
//!
//! Values saved by one phase are handed to the next phase's process by the
//! platform as `STATE_<key>` environment variables. Within one process the
//! store also remembers what it wrote, so a value is readable right after it
//! is saved.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::core::snapshot::{SENTINEL_KEY, Snapshot, decode_keys};
use crate::error::{ActionError, Result};
use crate::io::console::Console;

/// Fixed key under which the warning counter is persisted.
pub const WARNINGS_KEY: &str = "warnings";

/// Minimal store contract: read a value, write a value.
pub trait StateStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Store backed by the GitHub Actions state file protocol.
#[derive(Debug)]
pub struct ActionsStateStore {
    /// Values restored from `STATE_*` variables.
    restored: HashMap<String, String>,
    /// Values written during this process.
    written: HashMap<String, String>,
    /// File named by `GITHUB_STATE`; writes are only kept in memory without it.
    state_file: Option<PathBuf>,
}

impl ActionsStateStore {
    pub fn new(restored: HashMap<String, String>, state_file: Option<PathBuf>) -> Self {
        Self {
            restored,
            written: HashMap::new(),
            state_file,
        }
    }

    /// Build from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from an explicit variable list (`STATE_*` and `GITHUB_STATE`).
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut restored = HashMap::new();
        let mut state_file = None;
        for (name, value) in vars {
            if name == "GITHUB_STATE" {
                if !value.is_empty() {
                    state_file = Some(PathBuf::from(value));
                }
            } else if let Some(key) = name.strip_prefix("STATE_") {
                restored.insert(key.to_string(), value);
            }
        }
        debug!(
            restored = restored.len(),
            has_state_file = state_file.is_some(),
            "state store opened"
        );
        Self::new(restored, state_file)
    }

    fn append_record(&self, key: &str, value: &str) -> Result<()> {
        let delimiter = format!("ghadelimiter_{:016x}", rand::random::<u64>());
        self.append_with_delimiter(key, value, &delimiter)
    }

    fn append_with_delimiter(&self, key: &str, value: &str, delimiter: &str) -> Result<()> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };
        let write_error = |reason: String| ActionError::StateWrite {
            key: key.to_string(),
            reason,
        };

        if key.contains(delimiter) || value.contains(delimiter) {
            return Err(write_error("value contains the record delimiter".to_string()));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| write_error(format!("open {}: {err}", path.display())))?;
        write!(file, "{}", format_record(key, value, delimiter))
            .map_err(|err| write_error(format!("write {}: {err}", path.display())))?;
        Ok(())
    }
}

impl StateStore for ActionsStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.written
            .get(key)
            .or_else(|| self.restored.get(key))
            .cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.append_record(key, value)?;
        self.written.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `GITHUB_STATE` record in heredoc form.
pub fn format_record(key: &str, value: &str, delimiter: &str) -> String {
    format!("{key}<<{delimiter}\n{value}\n{delimiter}\n")
}

/// In-memory store, used for tests and dry runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStateStore {
    values: HashMap<String, String>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read the sentinel, then every key it names.
///
/// A missing or malformed sentinel is [`ActionError::StateCorrupt`]. Keys
/// listed in the sentinel but absent from the store restore as empty strings.
#[instrument(skip_all)]
pub fn restore_state<S, C>(store: &S, console: &mut C) -> Result<Snapshot>
where
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    console.start_group("Restoring state...");
    console.info("");
    let restored = load_snapshot(store, console);
    console.info("");
    console.end_group();
    restored
}

/// Like [`restore_state`], but a store that never had state saved into it
/// yields an empty snapshot. A malformed sentinel is still an error.
pub fn restore_state_or_empty<S, C>(store: &S, console: &mut C) -> Result<Snapshot>
where
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    if store.get(SENTINEL_KEY).is_none() {
        debug!("no saved state, starting empty");
        console.start_group("Restoring state...");
        console.info("");
        console.info("No saved state found.");
        console.info("");
        console.end_group();
        return Ok(Snapshot::new());
    }
    restore_state(store, console)
}

fn load_snapshot<S, C>(store: &S, console: &mut C) -> Result<Snapshot>
where
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    let keys = decode_keys(store.get(SENTINEL_KEY).as_deref())?;
    console.info(&format!("Loaded keys: {}", keys.join(",")));

    let mut snapshot = Snapshot::new();
    for key in keys {
        let value = store.get(&key).unwrap_or_default();
        console.info(&format!("Restored value {value} for state {key}."));
        snapshot.insert(key, value);
    }
    debug!(keys = snapshot.len(), "state restored");
    Ok(snapshot)
}

/// Write every value, then the sentinel listing their keys.
///
/// The sentinel goes last so it never names a key that was not written.
#[instrument(skip_all, fields(keys = snapshot.len()))]
pub fn save_state<S, C>(store: &mut S, console: &mut C, snapshot: &Snapshot) -> Result<()>
where
    S: StateStore + ?Sized,
    C: Console + ?Sized,
{
    if let Some(key) = snapshot.keys().iter().find(|key| is_reserved(key)) {
        return Err(ActionError::StateWrite {
            key: key.clone(),
            reason: "reserved key".to_string(),
        });
    }

    console.start_group("Saving state...");
    console.info("");

    let saved = (|| -> Result<()> {
        for (key, value) in snapshot.iter() {
            store.set(key, value)?;
            console.info(&format!("Saved value {value} for state {key}."));
        }
        store.set(SENTINEL_KEY, &snapshot.encode_keys())
    })();

    console.info("");
    console.end_group();
    saved
}

/// Keys the store protocol owns; phase state may not use them.
pub fn is_reserved(key: &str) -> bool {
    key == SENTINEL_KEY || key == WARNINGS_KEY
}

/// Warning count persisted by earlier phases (zero when absent or unreadable).
pub fn persisted_warnings<S: StateStore + ?Sized>(store: &S) -> u32 {
    store
        .get(WARNINGS_KEY)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
}
