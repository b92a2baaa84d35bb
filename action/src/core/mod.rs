//! Deterministic, pure logic shared by the action phases.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod baseline;
pub mod ledger;
pub mod project;
pub mod snapshot;
pub mod types;
