//! Result of a single bounded subprocess run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the harness records about one process invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Exit code; `None` when the process was killed on timeout.
    pub exit_code: Option<i32>,
    /// Wall-clock time the process was allowed to consume.
    pub duration: Duration,
    /// Captured stdout as UTF-8 text (lossy).
    pub stdout: String,
    /// Captured stderr as UTF-8 text (lossy).
    pub stderr: String,
    /// Whether the wall-clock limit was exceeded.
    pub timed_out: bool,
    /// Timestamp when the process was spawned.
    pub started_at: DateTime<Utc>,
    /// Timestamp when the outcome was recorded.
    pub completed_at: DateTime<Utc>,
}

impl RunOutcome {
    /// Outcome for a process that ran to completion.
    pub fn finished(
        exit_code: i32,
        duration: Duration,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            exit_code: Some(exit_code),
            duration,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
            started_at: start_of(duration),
            completed_at: Utc::now(),
        }
    }

    /// Outcome for a process killed at the wall-clock limit.
    ///
    /// Streams are empty and there is no exit code, matching the contract
    /// the reporter relies on for empty time/return columns.
    pub fn timed_out(duration: Duration) -> Self {
        Self {
            exit_code: None,
            duration,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: true,
            started_at: start_of(duration),
            completed_at: Utc::now(),
        }
    }

    /// Synthetic outcome for a process that could not be launched at all.
    ///
    /// Exit code `-1`, the failure text as stderr.
    pub fn launch_failure(duration: Duration, error: impl Into<String>) -> Self {
        Self {
            exit_code: Some(-1),
            duration,
            stdout: String::new(),
            stderr: error.into(),
            timed_out: false,
            started_at: start_of(duration),
            completed_at: Utc::now(),
        }
    }

    /// True when the process finished with exit code 0 inside the limit.
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Classifies this outcome into its reporting category.
    pub fn kind(&self) -> OutcomeKind {
        if self.timed_out {
            OutcomeKind::Timeout
        } else if self.exit_code == Some(0) {
            OutcomeKind::Success
        } else {
            OutcomeKind::NonZeroExit
        }
    }
}

/// Mutually exclusive classification of a run outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Exit 0 within the limit.
    Success,
    /// Killed at the wall-clock limit.
    Timeout,
    /// Ran to completion with a non-zero exit code (includes launch
    /// failures, which carry the synthetic code `-1`).
    NonZeroExit,
}

fn start_of(duration: Duration) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::from_std(duration).unwrap_or_default()
}
