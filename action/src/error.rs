//! Error types surfaced by action phases.
//!
//! Every variant is fatal to the phase that raised it. Advisories are not
//! errors; they go through [`crate::context::RunContext::record_warning`].

use thiserror::Error;

/// Result alias for action operations.
pub type Result<T> = std::result::Result<T, ActionError>;

#[derive(Debug, Error)]
pub enum ActionError {
    /// A command that opted into failure-on-nonzero exited with a non-zero code.
    #[error("{message}")]
    CommandFailed { message: String, exit_code: i32 },

    /// The `keys` sentinel in the state store is missing or unparseable.
    #[error("Unable to restore state ({reason}).")]
    StateCorrupt { reason: String },

    /// The process could not be started at all.
    #[error("Unable to run {command} ({source}).")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to save state {key} ({reason}).")]
    StateWrite { key: String, reason: String },

    #[error("{0}")]
    Project(String),

    #[error("{0}")]
    Hosting(String),

    #[error(
        "This action is not yet implemented. Contact the instructor for instructions on how to request code review."
    )]
    NotImplemented,
}

impl ActionError {
    /// Exit code carried by a failed command, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ActionError::CommandFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}
