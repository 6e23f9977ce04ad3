//! Bounded execution of one external command.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, warn};

use super::RunOutcome;

/// Runs `command` with stdin redirected from `stdin_file` under a wall-clock
/// limit.
///
/// The command string is split on whitespace into program and arguments.
/// stdout and stderr are captured as text. On timeout the child is killed
/// (via `kill_on_drop`) and the outcome carries no exit code and empty
/// streams. Launch failures come back as a synthetic `-1` outcome with the
/// error text as stderr; this function never returns an error.
pub async fn run_with_limit(command: &str, stdin_file: &Path, timeout: Duration) -> RunOutcome {
    let start = Instant::now();

    let mut words = command.split_whitespace();
    let program = match words.next() {
        Some(p) => p,
        None => return RunOutcome::launch_failure(start.elapsed(), "empty command"),
    };

    let stdin = match std::fs::File::open(stdin_file) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to open stdin file {}: {}", stdin_file.display(), e);
            return RunOutcome::launch_failure(
                start.elapsed(),
                format!("Failed to open {}: {}", stdin_file.display(), e),
            );
        }
    };

    debug!(
        "Running '{}' < {} (limit {:?})",
        command,
        stdin_file.display(),
        timeout
    );

    let child = Command::new(program)
        .args(words)
        .stdin(Stdio::from(stdin))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to spawn '{}': {}", program, e);
            return RunOutcome::launch_failure(start.elapsed(), e.to_string());
        }
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let elapsed = start.elapsed();
            let exit_code = output.status.code().unwrap_or(-1);
            RunOutcome::finished(
                exit_code,
                elapsed,
                String::from_utf8_lossy(&output.stdout).to_string(),
                String::from_utf8_lossy(&output.stderr).to_string(),
            )
        }
        Ok(Err(e)) => RunOutcome::launch_failure(start.elapsed(), e.to_string()),
        Err(_) => {
            // The dropped future kills the child.
            debug!("'{}' exceeded its {:?} limit", command, timeout);
            RunOutcome::timed_out(start.elapsed())
        }
    }
}
