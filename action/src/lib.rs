//! Code review request action for course project repositories.
//!
//! The action runs as three phases (setup, request, cleanup), each a separate
//! process that shares state through the workflow state store. The
//! architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure logic (status ledger, state snapshot, release tag
//!   parsing, grep baselines). No I/O.
//! - **[`io`]**: Side-effecting operations (process execution, state store,
//!   workflow console, config files, hosting API boundary). Isolated behind
//!   traits so tests can substitute them.
//!
//! Orchestration modules ([`phase`], [`setup`], [`request`], [`cleanup`])
//! coordinate core logic with I/O through a [`context::RunContext`].

pub mod cleanup;
pub mod context;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod phase;
pub mod request;
pub mod setup;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
