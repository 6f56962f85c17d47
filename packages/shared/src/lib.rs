//! Shared utilities for the tsudoi workspace.
//!
//! Logging setup and clock helpers used by the client crate.

pub mod logger;
pub mod time;
