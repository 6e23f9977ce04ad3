//! Command-line interface for coverbench.
//!
//! Provides the four judging modes plus the standalone `check` verifier.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
