//! CLI command definitions for coverbench.
//!
//! One subcommand per evaluation mode, mirroring the contest's original
//! harness surface (`--time_limit`, `--max_time_limit_exceeded`), plus a
//! `check` subcommand that lets this binary act as the external checker.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use crate::pipeline::config::{DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR};
use crate::pipeline::{HarnessConfig, Mode};
use crate::report;
use crate::verify::{check_exact, check_kernel, check_lb, check_ub, Verdict};

/// Judging harness for a vertex-cover contest.
#[derive(Parser)]
#[command(name = "coverbench")]
#[command(about = "Run contestant executables against vertex-cover instances and score them")]
#[command(version)]
#[command(
    long_about = "coverbench runs contestant-supplied executables against fixed instances under a \
wall-clock limit, verifies the produced solutions, and streams one CSV row per instance.\n\n\
Example usage:\n  coverbench ub ./my_solver --time_limit 30\n  \
coverbench kernel ./kernelize ./heuristic ./lift"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Judge an exact solver: covers must not exceed the optimum.
    Exact(JudgeArgs),

    /// Judge a lower-bound solver: scored `L / S`.
    Lb(JudgeArgs),

    /// Judge an upper-bound (approximation) solver: scored `S / |cover|`.
    Ub(JudgeArgs),

    /// Judge a kernelization pipeline: kernelize, seed a heuristic cover,
    /// lift it back to the original graph. Scored by size reduction.
    Kernel(KernelArgs),

    /// Verify one instance's artifacts and print the checker protocol
    /// (`OK` / `OK OK <score>` / `WRONG <reason>`, newline-separated).
    Check(CheckArgs),
}

/// Arguments shared by the single-executable modes.
#[derive(Parser, Debug)]
pub struct JudgeArgs {
    /// Path to the contestant executable.
    pub executable: String,

    /// Time limit [sec] per instance.
    #[arg(long = "time_limit", default_value_t = 60)]
    pub time_limit: u64,

    /// Timeouts tolerated per instance group before the rest is skipped.
    #[arg(long = "max_time_limit_exceeded", default_value_t = 10)]
    pub max_time_limit_exceeded: usize,

    /// Directory containing `*.in` instances.
    #[arg(long, default_value = DEFAULT_INPUT_DIR)]
    pub input_dir: String,

    /// Directory containing matching `*.out` reference outputs.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: String,

    /// External checker executable; verification is in-process when absent.
    #[arg(long)]
    pub checker: Option<PathBuf>,

    /// Write the full session report as JSON to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for `coverbench kernel`.
#[derive(Parser, Debug)]
pub struct KernelArgs {
    /// Kernelizer executable (instance on stdin, reduced graph on stdout).
    pub kernel_executable: String,

    /// Heuristic executable (reduced graph on stdin, seed cover on stdout).
    pub heuristic_executable: String,

    /// Lifting executable (combined sections on stdin, final cover on stdout).
    pub lifting_executable: String,

    /// Time limit [sec] for the kernelizer and lifter stages.
    #[arg(long = "time_limit", default_value_t = 60)]
    pub time_limit: u64,

    /// Timeouts tolerated per instance group before the rest is skipped.
    #[arg(long = "max_time_limit_exceeded", default_value_t = 1)]
    pub max_time_limit_exceeded: usize,

    /// Directory containing `*.in` instances.
    #[arg(long, default_value = DEFAULT_INPUT_DIR)]
    pub input_dir: String,

    /// Directory containing matching `*.out` reference outputs.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: String,

    /// External checker executable; verification is in-process when absent.
    #[arg(long)]
    pub checker: Option<PathBuf>,

    /// Write the full session report as JSON to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for `coverbench check`.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Evaluation mode to verify under.
    #[arg(value_enum)]
    pub mode: Mode,

    /// Original instance file.
    pub input_file: PathBuf,

    /// Contestant output file.
    pub user_output_file: PathBuf,

    /// Model (reference) output file.
    pub model_output_file: PathBuf,

    /// Heuristic seed file (kernel mode only).
    pub heuristic_file: Option<PathBuf>,

    /// Reduced graph file (kernel mode only).
    pub kernel_file: Option<PathBuf>,
}

/// Parses command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Executes the parsed CLI command.
pub async fn run_with_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Exact(args) => run_judge(Mode::Exact, args).await,
        Commands::Lb(args) => run_judge(Mode::Lb, args).await,
        Commands::Ub(args) => run_judge(Mode::Ub, args).await,
        Commands::Kernel(args) => run_kernel(args).await,
        Commands::Check(args) => run_check(args),
    }
}

async fn run_judge(mode: Mode, args: JudgeArgs) -> Result<()> {
    let mut config = HarnessConfig::single(mode, args.executable)
        .with_time_limit(Duration::from_secs(args.time_limit))
        .with_max_time_limit_exceeded(args.max_time_limit_exceeded)
        .with_input_dir(args.input_dir)
        .with_output_dir(args.output_dir);
    if let Some(checker) = args.checker {
        config = config.with_checker(checker);
    }
    if let Some(report_path) = args.report {
        config = config.with_report_path(report_path);
    }

    let totals = report::run_session(config)
        .await
        .context("judging session failed")?;
    info!(
        "Session complete: {} instance(s), {} OK, {} timelimit",
        totals.instances, totals.ok, totals.time_limit
    );
    Ok(())
}

async fn run_kernel(args: KernelArgs) -> Result<()> {
    let mut config = HarnessConfig::kernel(
        args.kernel_executable,
        args.heuristic_executable,
        args.lifting_executable,
    )
    .with_time_limit(Duration::from_secs(args.time_limit))
    .with_max_time_limit_exceeded(args.max_time_limit_exceeded)
    .with_input_dir(args.input_dir)
    .with_output_dir(args.output_dir);
    if let Some(checker) = args.checker {
        config = config.with_checker(checker);
    }
    if let Some(report_path) = args.report {
        config = config.with_report_path(report_path);
    }

    let totals = report::run_session(config)
        .await
        .context("judging session failed")?;
    info!(
        "Session complete: {} instance(s), {} OK, {} timelimit",
        totals.instances, totals.ok, totals.time_limit
    );
    Ok(())
}

/// Runs one verification in checker-protocol mode.
///
/// Prints `OK` (exact), `OK\nOK\n<score>` (scored modes) or
/// `WRONG\n<reason>` and exits non-zero, so this binary can stand in for a
/// contest's external checker executable.
fn run_check(args: CheckArgs) -> Result<()> {
    let verdict = match args.mode {
        Mode::Exact => check_exact(&args.input_file, &args.user_output_file, &args.model_output_file),
        Mode::Ub => check_ub(&args.input_file, &args.user_output_file, &args.model_output_file),
        Mode::Lb => check_lb(&args.user_output_file, &args.model_output_file),
        Mode::Kernel => {
            let (heuristic, kernel) = match (&args.heuristic_file, &args.kernel_file) {
                (Some(h), Some(k)) => (h, k),
                _ => bail!("kernel mode requires <heuristic_file> and <kernel_file>"),
            };
            check_kernel(
                &args.input_file,
                &args.user_output_file,
                &args.model_output_file,
                heuristic,
                kernel,
            )
        }
    };

    print_protocol(args.mode, &verdict);
    if !verdict.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_protocol(mode: Mode, verdict: &Verdict) {
    if verdict.is_ok() {
        if mode.is_scored() {
            println!("OK\nOK\n{}", verdict.score);
        } else {
            println!("OK");
        }
    } else {
        println!("WRONG\n{}", verdict.message);
    }
}
