//! Configuration for a judging session.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default instance directory.
pub const DEFAULT_INPUT_DIR: &str = "vc/in";

/// Default reference-output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "vc/out";

/// Wall-clock limit for the heuristic stage in kernel mode, in seconds.
///
/// The heuristic is meant to run to near-completion rather than be capped at
/// contest time, so it gets a fixed, effectively unlimited budget.
pub const HEURISTIC_TIME_LIMIT_SECS: u64 = 60 * 1000 * 5;

/// Evaluation mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Optimal vertex cover: binary verdict.
    Exact,
    /// Lower bound on the optimum: scored `L / S`.
    Lb,
    /// Upper bound (approximation): scored `S / |cover|`.
    Ub,
    /// Kernelization: three-stage pipeline, scored by size reduction.
    Kernel,
}

impl Mode {
    /// Protocol name of the mode, as passed to external checkers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Exact => "exact",
            Mode::Lb => "lb",
            Mode::Ub => "ub",
            Mode::Kernel => "kernel",
        }
    }

    /// Whether result rows carry a points column.
    pub fn is_scored(&self) -> bool {
        !matches!(self, Mode::Exact)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The contestant executables for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StagePrograms {
    /// One executable handles the whole instance (exact/lb/ub).
    Single { executable: String },
    /// The kernel-mode stage chain.
    Kernel {
        kernelizer: String,
        heuristic: String,
        lifter: String,
    },
}

/// Full configuration for one harness invocation.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Evaluation mode.
    pub mode: Mode,
    /// Contestant executables.
    pub programs: StagePrograms,
    /// Wall-clock limit per contest-timed stage.
    pub time_limit: Duration,
    /// Timeout budget per instance group before the rest is skipped.
    pub max_time_limit_exceeded: usize,
    /// Directory holding `*.in` instances.
    pub input_dir: PathBuf,
    /// Directory holding matching `*.out` reference outputs.
    pub output_dir: PathBuf,
    /// External checker executable; in-process verification when absent.
    pub checker: Option<PathBuf>,
    /// Where to write the JSON session report, if anywhere.
    pub report_path: Option<PathBuf>,
}

impl HarnessConfig {
    /// Configuration for a single-stage mode (`exact`, `lb`, `ub`).
    pub fn single(mode: Mode, executable: impl Into<String>) -> Self {
        Self {
            mode,
            programs: StagePrograms::Single {
                executable: executable.into(),
            },
            time_limit: Duration::from_secs(60),
            max_time_limit_exceeded: 10,
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            checker: None,
            report_path: None,
        }
    }

    /// Configuration for kernel mode with its three-stage chain.
    ///
    /// Kernel runs are long; the default timeout budget is one strike.
    pub fn kernel(
        kernelizer: impl Into<String>,
        heuristic: impl Into<String>,
        lifter: impl Into<String>,
    ) -> Self {
        Self {
            mode: Mode::Kernel,
            programs: StagePrograms::Kernel {
                kernelizer: kernelizer.into(),
                heuristic: heuristic.into(),
                lifter: lifter.into(),
            },
            time_limit: Duration::from_secs(60),
            max_time_limit_exceeded: 1,
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            checker: None,
            report_path: None,
        }
    }

    /// Sets the per-stage wall-clock limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    /// Sets the per-group timeout budget.
    pub fn with_max_time_limit_exceeded(mut self, max: usize) -> Self {
        self.max_time_limit_exceeded = max;
        self
    }

    /// Sets the instance directory.
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Sets the reference-output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Routes verification through an external checker executable.
    pub fn with_checker(mut self, checker: impl Into<PathBuf>) -> Self {
        self.checker = Some(checker.into());
        self
    }

    /// Enables the JSON session report.
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }
}
