//! Result streaming, score accumulation and the session driver.
//!
//! Rows are printed and flushed per instance so a run can be tailed live.
//! The driver walks instance groups sequentially, keeps a per-group timeout
//! budget, escalates the first `Wrong` verdict into a run-ending error, and
//! prints the overall score only for clean runs.

use std::fs;
use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::pipeline::{discover_groups, HarnessConfig, InstanceRow, Mode, Orchestrator};
use crate::verify::VerdictStatus;

/// Errors that end a judging session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A contestant produced an incorrect answer; the run stops here.
    #[error("Wrong Answer: {0}")]
    WrongAnswer(VerdictStatus),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Running totals across all instances of one session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunTotals {
    /// Sum of points across scored instances.
    pub score: f64,
    /// Instances processed (skipped ones excluded).
    pub instances: usize,
    /// Instances with an `OK` verdict.
    pub ok: usize,
    /// Instances that hit the wall clock.
    pub time_limit: usize,
    /// Instances judged wrong (at most 1, the run stops there).
    pub wrong: usize,
}

impl RunTotals {
    /// Folds one row into the totals.
    pub fn add(&mut self, row: &InstanceRow) {
        self.instances += 1;
        self.score += row.points;
        match row.status {
            VerdictStatus::Ok => self.ok += 1,
            VerdictStatus::TimeLimit => self.time_limit += 1,
            VerdictStatus::Wrong => self.wrong += 1,
        }
    }
}

/// Full session record for the optional JSON report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub mode: Mode,
    pub rows: Vec<InstanceRow>,
    pub totals: RunTotals,
}

/// CSV header for a mode's result stream.
pub fn header(mode: Mode) -> &'static str {
    match mode {
        Mode::Kernel => "file,status,points,time_kernel,time_lifting,return,stderr",
        Mode::Lb | Mode::Ub => "file,status,points,time,return,stderr",
        Mode::Exact => "file,status,time,return,stderr",
    }
}

/// Replaces newlines with literal `\n` so stderr stays on one CSV row.
pub fn escape_newlines(s: &str) -> String {
    s.replace('\n', "\\n")
}

fn fmt_secs(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

fn fmt_opt_secs(duration: Option<Duration>) -> String {
    duration.map(fmt_secs).unwrap_or_default()
}

fn fmt_return(code: Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_default()
}

/// Formats one result row for the console stream.
pub fn format_row(mode: Mode, row: &InstanceRow) -> String {
    let stderr = escape_newlines(&row.stderr);
    match mode {
        Mode::Kernel => format!(
            "{},{},{},{},{},{},{}",
            row.file,
            row.status,
            row.points,
            fmt_opt_secs(row.time_primary),
            // Skipped lifting stages report 0, not an empty column.
            row.time_lifting.map(fmt_secs).unwrap_or_else(|| "0".into()),
            fmt_return(row.return_code),
            stderr,
        ),
        Mode::Lb | Mode::Ub => format!(
            "{},{},{},{},{},{}",
            row.file,
            row.status,
            row.points,
            fmt_opt_secs(row.time_primary),
            fmt_return(row.return_code),
            stderr,
        ),
        Mode::Exact => format!(
            "{},{},{},{},{}",
            row.file,
            row.status,
            fmt_opt_secs(row.time_primary),
            fmt_return(row.return_code),
            stderr,
        ),
    }
}

/// Runs a whole judging session: discovery, pipeline, streaming, policy.
///
/// Returns the totals for a clean run. A `Wrong` verdict surfaces as
/// [`SessionError::WrongAnswer`] after its row is printed, and suppresses
/// the overall-score line.
pub async fn run_session(config: HarnessConfig) -> Result<RunTotals, SessionError> {
    let groups = discover_groups(&config.input_dir)?;
    info!(
        "Discovered {} group(s) under {}",
        groups.len(),
        config.input_dir.display()
    );

    let mode = config.mode;
    let max_tle = config.max_time_limit_exceeded;
    let report_path = config.report_path.clone();
    let orchestrator = Orchestrator::new(config)?;

    println!("{}", header(mode));

    let mut totals = RunTotals::default();
    let mut rows = Vec::new();
    let mut wrong = false;

    'groups: for group in groups {
        let mut tles = 0;
        for file in &group.files {
            let row = orchestrator.judge_instance(file).await;
            println!("{}", format_row(mode, &row));
            std::io::stdout().flush()?;

            totals.add(&row);
            let status = row.status;
            rows.push(row);

            match status {
                VerdictStatus::Wrong => {
                    wrong = true;
                    break 'groups;
                }
                VerdictStatus::TimeLimit => {
                    tles += 1;
                    if tles >= max_tle {
                        warn!(
                            "Group {} exhausted its timeout budget ({}); skipping the rest",
                            group.id, max_tle
                        );
                        break;
                    }
                }
                VerdictStatus::Ok => {}
            }
        }
    }

    if let Some(path) = report_path {
        let report = SessionReport { mode, rows, totals };
        fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        info!("Wrote session report to {}", path.display());
    }

    if wrong {
        return Err(SessionError::WrongAnswer(VerdictStatus::Wrong));
    }

    println!("overall score: {}", totals.score);
    Ok(totals)
}
