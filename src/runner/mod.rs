//! Subprocess execution with wall-clock limits.
//!
//! This module runs one contestant executable at a time with stdin redirected
//! from an instance file, captures its streams, and classifies the outcome.
//!
//! ```text
//! instance file → stdin → contestant process → RunOutcome
//! ```
//!
//! Launch-level failures (missing binary, unreadable stdin file) never
//! propagate as errors: they become a synthetic failing outcome so the
//! harness can emit a reportable row instead of crashing the whole run.

pub mod outcome;
pub mod process;

pub use outcome::{OutcomeKind, RunOutcome};
pub use process::run_with_limit;
