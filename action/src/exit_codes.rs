//! Stable exit codes for the action binary.

/// The phase completed.
pub const OK: i32 = 0;
/// The phase failed, or the binary could not start it (bad config, bad inputs).
pub const FAILED: i32 = 1;
