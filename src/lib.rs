//! coverbench: judging harness for a vertex-cover contest.
//!
//! Runs contestant executables against fixed instances under wall-clock
//! limits, verifies the produced solutions per evaluation mode (`exact`,
//! `lb`, `ub`, `kernel`), and reports per-instance and aggregate scores.

pub mod cli;
pub mod graph;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod verify;

// Re-export the types most callers need.
pub use pipeline::{HarnessConfig, InstanceRow, Mode, Orchestrator};
pub use report::{run_session, RunTotals, SessionError};
pub use runner::{run_with_limit, RunOutcome};
pub use verify::{Verdict, VerdictStatus};
