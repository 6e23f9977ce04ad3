//! Per-instance stage sequencing and verification dispatch.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::config::{HarnessConfig, Mode, StagePrograms, HEURISTIC_TIME_LIMIT_SECS};
use super::discover::reference_name;
use crate::runner::{run_with_limit, RunOutcome};
use crate::verify::{
    check_exact, check_kernel, check_lb, check_ub, run_external_checker, Verdict, VerdictStatus,
};

/// One reported result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRow {
    /// Instance file name.
    pub file: String,
    /// Verdict status for the instance.
    pub status: VerdictStatus,
    /// Points awarded (0 unless `OK` in a scored mode).
    pub points: f64,
    /// Primary stage time (kernelizer time in kernel mode). `None` when the
    /// stage timed out in a single-stage mode.
    pub time_primary: Option<Duration>,
    /// Lifting stage time; `None` when the stage never ran.
    pub time_lifting: Option<Duration>,
    /// Exit code of the last executed stage; `None` after a timeout.
    pub return_code: Option<i32>,
    /// Accumulated stderr across stages plus verification diagnostics.
    pub stderr: String,
}

/// Scratch files threaded between sequential stages.
///
/// Backed by a temporary directory; each file is overwritten per instance,
/// which is safe because never more than one instance is in flight.
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Kernelizer stdout, the reduced graph.
    pub fn kernel_file(&self) -> PathBuf {
        self.dir.path().join("kernel.txt")
    }

    /// Heuristic stdout, the seed cover with its lower-bound annotation.
    pub fn heuristic_file(&self) -> PathBuf {
        self.dir.path().join("heuristic.txt")
    }

    /// Concatenated input for the lifting stage.
    pub fn lifting_input(&self) -> PathBuf {
        self.dir.path().join("lifting_in.txt")
    }

    /// Lifter stdout, the contestant's final cover.
    pub fn lifting_output(&self) -> PathBuf {
        self.dir.path().join("lifting_out.txt")
    }

    /// Primary-stage stdout for single-stage modes.
    pub fn user_output(&self) -> PathBuf {
        self.dir.path().join("user_out.txt")
    }
}

/// The three labeled sections the lifting stage consumes.
#[derive(Debug, Clone, Copy)]
pub struct LiftingInput<'a> {
    /// The original instance file.
    pub original: &'a Path,
    /// The reduced graph produced by the kernelizer.
    pub kernel: &'a Path,
    /// The heuristic's seed solution.
    pub heuristic: &'a Path,
}

impl LiftingInput<'_> {
    /// Serializes the three sections under their markers into `dest`.
    pub fn write_to(&self, dest: &Path) -> io::Result<()> {
        let mut combined = String::from("#InputGraph\n");
        combined.push_str(&fs::read_to_string(self.original)?);
        combined.push_str("#KernelGraph\n");
        combined.push_str(&fs::read_to_string(self.kernel)?);
        combined.push_str("#StartSolution\n");
        combined.push_str(&fs::read_to_string(self.heuristic)?);
        fs::write(dest, combined)
    }
}

/// Drives the stage pipeline and verification for single instances.
pub struct Orchestrator {
    config: HarnessConfig,
    scratch: ScratchSpace,
}

impl Orchestrator {
    pub fn new(config: HarnessConfig) -> io::Result<Self> {
        Ok(Self {
            config,
            scratch: ScratchSpace::new()?,
        })
    }

    /// Runs all pipeline stages for one instance and verifies the result.
    ///
    /// Never fails: every failure shape degrades to a reportable row.
    pub async fn judge_instance(&self, file_name: &str) -> InstanceRow {
        let in_file = self.config.input_dir.join(file_name);
        let out_file = self.config.output_dir.join(reference_name(file_name));

        info!("Judging {} in {} mode", file_name, self.config.mode);

        match self.config.programs.clone() {
            StagePrograms::Single { executable } => {
                self.judge_single(file_name, &executable, &in_file, &out_file)
                    .await
            }
            StagePrograms::Kernel {
                kernelizer,
                heuristic,
                lifter,
            } => {
                self.judge_kernel(file_name, &kernelizer, &heuristic, &lifter, &in_file, &out_file)
                    .await
            }
        }
    }

    /// Single-stage flow for `exact`, `lb` and `ub`.
    async fn judge_single(
        &self,
        file_name: &str,
        executable: &str,
        in_file: &Path,
        out_file: &Path,
    ) -> InstanceRow {
        let outcome = run_with_limit(executable, in_file, self.config.time_limit).await;

        if outcome.timed_out {
            return InstanceRow {
                file: file_name.to_string(),
                status: VerdictStatus::TimeLimit,
                points: 0.0,
                time_primary: None,
                time_lifting: None,
                return_code: None,
                stderr: outcome.stderr,
            };
        }

        if !outcome.is_success() {
            return InstanceRow {
                file: file_name.to_string(),
                status: VerdictStatus::Wrong,
                points: 0.0,
                time_primary: Some(outcome.duration),
                time_lifting: None,
                return_code: outcome.exit_code,
                stderr: format!("{}\nNon zero exit code", outcome.stderr),
            };
        }

        let user_out = self.scratch.user_output();
        if let Err(e) = fs::write(&user_out, &outcome.stdout) {
            warn!("Failed to persist contestant output: {}", e);
            return InstanceRow {
                file: file_name.to_string(),
                status: VerdictStatus::Wrong,
                points: 0.0,
                time_primary: Some(outcome.duration),
                time_lifting: None,
                return_code: outcome.exit_code,
                stderr: format!("{}\n{}", outcome.stderr, e),
            };
        }

        let verdict = self
            .verify(in_file, &user_out, out_file, None, None)
            .await;

        self.row_from_verdict(file_name, &outcome, None, verdict)
    }

    /// Three-stage kernel flow: kernelize → heuristic seed → lift.
    async fn judge_kernel(
        &self,
        file_name: &str,
        kernelizer: &str,
        heuristic: &str,
        lifter: &str,
        in_file: &Path,
        out_file: &Path,
    ) -> InstanceRow {
        let mut stderr_acc = String::new();
        let mut time_lifting = None;
        let mut chain_complete = false;

        let kernel_outcome = run_with_limit(kernelizer, in_file, self.config.time_limit).await;
        let time_kernel = kernel_outcome.duration;
        stderr_acc.push_str(&kernel_outcome.stderr);
        let mut last = kernel_outcome;

        if last.is_success() {
            if let Err(row) = self.persist(file_name, &self.scratch.kernel_file(), &last, &stderr_acc)
            {
                return row;
            }

            let heuristic_limit = Duration::from_secs(HEURISTIC_TIME_LIMIT_SECS);
            let heuristic_outcome =
                run_with_limit(heuristic, &self.scratch.kernel_file(), heuristic_limit).await;
            stderr_acc.push_str(&heuristic_outcome.stderr);

            if heuristic_outcome.is_success() {
                last = heuristic_outcome;
                if let Err(row) =
                    self.persist(file_name, &self.scratch.heuristic_file(), &last, &stderr_acc)
                {
                    return row;
                }

                let sections = LiftingInput {
                    original: in_file,
                    kernel: &self.scratch.kernel_file(),
                    heuristic: &self.scratch.heuristic_file(),
                };
                if let Err(e) = sections.write_to(&self.scratch.lifting_input()) {
                    warn!("Failed to assemble lifting input: {}", e);
                    return self.kernel_failure_row(
                        file_name,
                        time_kernel,
                        None,
                        Some(-1),
                        format!("{}\n{}", stderr_acc, e),
                    );
                }

                let lift_outcome =
                    run_with_limit(lifter, &self.scratch.lifting_input(), self.config.time_limit)
                        .await;
                time_lifting = Some(lift_outcome.duration);
                stderr_acc.push_str(&lift_outcome.stderr);

                if lift_outcome.is_success() {
                    if let Err(row) = self.persist(
                        file_name,
                        &self.scratch.lifting_output(),
                        &lift_outcome,
                        &stderr_acc,
                    ) {
                        return row;
                    }
                    chain_complete = true;
                }
                last = lift_outcome;
            } else {
                stderr_acc.push_str("Failed to run heuristic");
                last = heuristic_outcome;
            }
        }

        if last.timed_out {
            debug!("{}: stage chain hit the wall clock", file_name);
            return InstanceRow {
                file: file_name.to_string(),
                status: VerdictStatus::TimeLimit,
                points: 0.0,
                time_primary: Some(time_kernel),
                time_lifting,
                return_code: None,
                stderr: stderr_acc,
            };
        }

        if !chain_complete {
            return self.kernel_failure_row(
                file_name,
                time_kernel,
                time_lifting,
                last.exit_code,
                format!("{}\nNon zero exit code", stderr_acc),
            );
        }

        let verdict = self
            .verify(
                in_file,
                &self.scratch.lifting_output(),
                out_file,
                Some(&self.scratch.heuristic_file()),
                Some(&self.scratch.kernel_file()),
            )
            .await;

        let mut row = InstanceRow {
            file: file_name.to_string(),
            status: verdict.status,
            points: verdict.score,
            time_primary: Some(time_kernel),
            time_lifting,
            return_code: last.exit_code,
            stderr: stderr_acc,
        };
        if !verdict.is_ok() {
            row.points = 0.0;
            row.stderr = format!("{}\n{}", row.stderr, verdict.message);
        }
        row
    }

    /// Dispatches to the external checker when configured, otherwise to the
    /// in-process procedures.
    async fn verify(
        &self,
        in_file: &Path,
        user_output: &Path,
        out_file: &Path,
        heuristic_file: Option<&Path>,
        kernel_file: Option<&Path>,
    ) -> Verdict {
        if let Some(checker) = &self.config.checker {
            return run_external_checker(
                checker,
                self.config.mode,
                in_file,
                user_output,
                out_file,
                heuristic_file,
                kernel_file,
            )
            .await;
        }

        match self.config.mode {
            Mode::Exact => check_exact(in_file, user_output, out_file),
            Mode::Ub => check_ub(in_file, user_output, out_file),
            Mode::Lb => check_lb(user_output, out_file),
            Mode::Kernel => match (heuristic_file, kernel_file) {
                (Some(heuristic), Some(kernel)) => {
                    check_kernel(in_file, user_output, out_file, heuristic, kernel)
                }
                _ => Verdict::wrong("Missing kernel artifacts"),
            },
        }
    }

    /// Builds the final row for a verified single-stage run.
    fn row_from_verdict(
        &self,
        file_name: &str,
        outcome: &RunOutcome,
        time_lifting: Option<Duration>,
        verdict: Verdict,
    ) -> InstanceRow {
        let mut stderr = outcome.stderr.clone();
        if !verdict.is_ok() {
            stderr = format!("{}\n{}", stderr, verdict.message);
        }
        InstanceRow {
            file: file_name.to_string(),
            status: verdict.status,
            points: if verdict.is_ok() { verdict.score } else { 0.0 },
            time_primary: Some(outcome.duration),
            time_lifting,
            return_code: outcome.exit_code,
            stderr,
        }
    }

    /// `Wrong` row for a kernel pipeline that broke before verification.
    fn kernel_failure_row(
        &self,
        file_name: &str,
        time_kernel: Duration,
        time_lifting: Option<Duration>,
        return_code: Option<i32>,
        stderr: String,
    ) -> InstanceRow {
        InstanceRow {
            file: file_name.to_string(),
            status: VerdictStatus::Wrong,
            points: 0.0,
            time_primary: Some(time_kernel),
            time_lifting,
            return_code,
            stderr,
        }
    }

    /// Writes a stage's stdout into a scratch artifact, degrading any I/O
    /// failure into a reportable row.
    fn persist(
        &self,
        file_name: &str,
        dest: &Path,
        outcome: &RunOutcome,
        stderr_acc: &str,
    ) -> Result<(), InstanceRow> {
        fs::write(dest, &outcome.stdout).map_err(|e| {
            warn!("Failed to write {}: {}", dest.display(), e);
            InstanceRow {
                file: file_name.to_string(),
                status: VerdictStatus::Wrong,
                points: 0.0,
                time_primary: Some(outcome.duration),
                time_lifting: None,
                return_code: Some(-1),
                stderr: format!("{}\n{}", stderr_acc, e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, HarnessConfig) {
        let temp = TempDir::new().unwrap();
        let in_dir = temp.path().join("in");
        let out_dir = temp.path().join("out");
        fs::create_dir_all(&in_dir).unwrap();
        fs::create_dir_all(&out_dir).unwrap();

        fs::write(in_dir.join("1.in"), "3 3\na b\nb c\na c\n").unwrap();
        fs::write(out_dir.join("1.out"), "2\n").unwrap();

        let config = HarnessConfig::single(Mode::Exact, "cat")
            .with_input_dir(&in_dir)
            .with_output_dir(&out_dir)
            .with_time_limit(Duration::from_secs(5));
        (temp, config)
    }

    /// Writes an executable shell script and returns its invocation string.
    fn script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        path.display().to_string()
    }

    #[tokio::test]
    async fn test_single_stage_ok() {
        let (temp, config) = fixture();
        // Echo a valid optimal cover regardless of stdin.
        let solver = script(temp.path(), "solver.sh", "printf 'a\\nb\\n'");
        let config = HarnessConfig::single(Mode::Exact, solver)
            .with_input_dir(config.input_dir)
            .with_output_dir(config.output_dir)
            .with_time_limit(Duration::from_secs(5));

        let orchestrator = Orchestrator::new(config).unwrap();
        let row = orchestrator.judge_instance("1.in").await;

        assert_eq!(row.status, VerdictStatus::Ok);
        assert_eq!(row.return_code, Some(0));
        assert!(row.time_primary.is_some());
    }

    #[tokio::test]
    async fn test_single_stage_wrong_cover() {
        let (temp, config) = fixture();
        let solver = script(temp.path(), "solver.sh", "printf 'a\\n'");
        let config = HarnessConfig::single(Mode::Exact, solver)
            .with_input_dir(config.input_dir)
            .with_output_dir(config.output_dir)
            .with_time_limit(Duration::from_secs(5));

        let orchestrator = Orchestrator::new(config).unwrap();
        let row = orchestrator.judge_instance("1.in").await;

        assert_eq!(row.status, VerdictStatus::Wrong);
        assert!(row.stderr.contains("Edge not covered"));
    }

    #[tokio::test]
    async fn test_single_stage_nonzero_exit() {
        let (_temp, config) = fixture();
        let config = HarnessConfig::single(Mode::Exact, "false")
            .with_input_dir(config.input_dir)
            .with_output_dir(config.output_dir)
            .with_time_limit(Duration::from_secs(5));

        let orchestrator = Orchestrator::new(config).unwrap();
        let row = orchestrator.judge_instance("1.in").await;

        assert_eq!(row.status, VerdictStatus::Wrong);
        assert!(row.stderr.contains("Non zero exit code"));
        assert_eq!(row.return_code, Some(1));
    }

    #[tokio::test]
    async fn test_single_stage_timeout() {
        let (_temp, config) = fixture();
        let config = HarnessConfig::single(Mode::Exact, "sleep 30")
            .with_input_dir(config.input_dir)
            .with_output_dir(config.output_dir)
            .with_time_limit(Duration::from_millis(100));

        let orchestrator = Orchestrator::new(config).unwrap();
        let row = orchestrator.judge_instance("1.in").await;

        assert_eq!(row.status, VerdictStatus::TimeLimit);
        assert_eq!(row.return_code, None);
        assert!(row.time_primary.is_none());
    }

    #[tokio::test]
    async fn test_lifting_input_sections() {
        let temp = TempDir::new().unwrap();
        let original = temp.path().join("g.in");
        let kernel = temp.path().join("k.txt");
        let heuristic = temp.path().join("h.txt");
        let dest = temp.path().join("lift.txt");
        fs::write(&original, "3 3\na b\n").unwrap();
        fs::write(&kernel, "1 0\n# difference: 1\n").unwrap();
        fs::write(&heuristic, "a\n# lower_bound: 1\n").unwrap();

        LiftingInput {
            original: &original,
            kernel: &kernel,
            heuristic: &heuristic,
        }
        .write_to(&dest)
        .unwrap();

        let combined = fs::read_to_string(&dest).unwrap();
        let input_pos = combined.find("#InputGraph\n").unwrap();
        let kernel_pos = combined.find("#KernelGraph\n").unwrap();
        let start_pos = combined.find("#StartSolution\n").unwrap();
        assert!(input_pos < kernel_pos && kernel_pos < start_pos);
        assert!(combined.contains("a b"));
        assert!(combined.contains("# difference: 1"));
    }

    #[tokio::test]
    async fn test_kernel_chain_failure_skips_later_stages() {
        let (temp, config) = fixture();
        // Kernelizer dies; heuristic would create a marker file if it ran.
        let marker = temp.path().join("heuristic-ran");
        let kernelizer = script(temp.path(), "kern.sh", "exit 3");
        let heuristic = script(
            temp.path(),
            "heu.sh",
            &format!("touch {}", marker.display()),
        );
        let lifter = script(temp.path(), "lift.sh", "cat");

        let config = HarnessConfig::kernel(kernelizer, heuristic, lifter)
            .with_input_dir(config.input_dir)
            .with_output_dir(config.output_dir)
            .with_time_limit(Duration::from_secs(5));

        let orchestrator = Orchestrator::new(config).unwrap();
        let row = orchestrator.judge_instance("1.in").await;

        assert_eq!(row.status, VerdictStatus::Wrong);
        assert_eq!(row.return_code, Some(3));
        assert!(row.time_lifting.is_none());
        assert!(!marker.exists());
    }
}
