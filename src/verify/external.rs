//! Out-of-process checker invocation.
//!
//! Legacy protocol: the checker is called as
//! `checker <mode> <input> <user_output> <model_output> [heuristic kernel]`,
//! signals success by printing the token `OK` anywhere on stdout, and for
//! scored modes carries the numeric score on the third stdout line.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, warn};

use super::Verdict;
use crate::pipeline::Mode;

/// Runs an external checker over one instance and parses its verdict.
///
/// Checker crashes and protocol violations come back as `Wrong` verdicts
/// carrying the combined output as the reason, the same way an in-process
/// failed check would.
pub async fn run_external_checker(
    checker: &Path,
    mode: Mode,
    input: &Path,
    user_output: &Path,
    model_output: &Path,
    heuristic_file: Option<&Path>,
    kernel_file: Option<&Path>,
) -> Verdict {
    let mut command = Command::new(checker);
    command
        .arg(mode.as_str())
        .arg(input)
        .arg(user_output)
        .arg(model_output);
    if let (Some(heuristic), Some(kernel)) = (heuristic_file, kernel_file) {
        command.arg(heuristic).arg(kernel);
    }

    debug!("Invoking external checker {} ({})", checker.display(), mode);

    let output = match command.output().await {
        Ok(output) => output,
        Err(e) => {
            warn!("External checker failed to start: {}", e);
            return Verdict::wrong(format!("Failed to run checker: {}", e));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !stdout.contains("OK") {
        return Verdict::wrong(format!("{}\n{}", stdout.trim_end(), stderr.trim_end()));
    }

    if mode.is_scored() {
        match stdout.lines().nth(2).and_then(|l| l.trim().parse::<f64>().ok()) {
            Some(score) => Verdict::ok_scored(score),
            None => Verdict::wrong(format!("Checker printed no score:\n{}", stdout.trim_end())),
        }
    } else {
        Verdict::ok()
    }
}
