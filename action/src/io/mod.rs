//! I/O adapters for the action phases.

pub mod config;
pub mod console;
pub mod hosting;
pub mod process;
pub mod state_store;
