//! In-process verification procedures for the four evaluation modes.
//!
//! Each procedure consumes the original instance, the contestant's output
//! and the model (reference) output, and returns a [`Verdict`]. The first
//! violated invariant decides the verdict; there is no partial credit once a
//! hard check fails. Messages match the reference checker verbatim so rows
//! stay comparable across harness generations.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{
    parse_difference, parse_graph, parse_graph_header, parse_lower_bound, parse_solution_set,
    parse_solution_size, Graph, GraphError,
};

/// Outcome of verifying one instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Overall status.
    pub status: VerdictStatus,
    /// Mode-specific score; 0 unless the status is `Ok`.
    pub score: f64,
    /// Diagnostic message (the failure reason for `Wrong`).
    pub message: String,
}

impl Verdict {
    /// Unscored success (exact mode).
    pub fn ok() -> Self {
        Self {
            status: VerdictStatus::Ok,
            score: 0.0,
            message: String::new(),
        }
    }

    /// Scored success (lb/ub/kernel modes).
    pub fn ok_scored(score: f64) -> Self {
        Self {
            status: VerdictStatus::Ok,
            score,
            message: String::new(),
        }
    }

    /// Failed verification with a reason.
    pub fn wrong(reason: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Wrong,
            score: 0.0,
            message: reason.into(),
        }
    }

    /// Wall-clock limit exceeded somewhere in the pipeline.
    pub fn time_limit() -> Self {
        Self {
            status: VerdictStatus::TimeLimit,
            score: 0.0,
            message: String::new(),
        }
    }

    /// True when verification passed.
    pub fn is_ok(&self) -> bool {
        self.status == VerdictStatus::Ok
    }
}

/// Status column of a result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Ok,
    Wrong,
    TimeLimit,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictStatus::Ok => write!(f, "OK"),
            VerdictStatus::Wrong => write!(f, "Wrong"),
            VerdictStatus::TimeLimit => write!(f, "timelimit"),
        }
    }
}

/// Shorthand: any artifact-reading failure becomes a `Wrong` verdict.
macro_rules! try_wrong {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => return Verdict::wrong(e.to_string()),
        }
    };
}

/// Checks that `candidate` covers every edge of the instance graph.
fn covers(graph: &Graph, candidate: &HashSet<String>) -> Result<(), Verdict> {
    match graph.uncovered_edge(candidate) {
        None => Ok(()),
        Some((u, v)) => {
            debug!("Edge ({}, {}) not covered", u, v);
            Err(Verdict::wrong("Edge not covered"))
        }
    }
}

/// Exact mode: the candidate must be a vertex cover no larger than the
/// optimum. Binary verdict, no score.
pub fn check_exact(input: &Path, user_output: &Path, model_output: &Path) -> Verdict {
    let sol_size = try_wrong!(parse_solution_size(model_output));
    let vc = try_wrong!(parse_solution_set(user_output));
    let graph = try_wrong!(parse_graph(input, false));

    if let Err(verdict) = covers(&graph, &vc) {
        return verdict;
    }
    if vc.len() > sol_size {
        return Verdict::wrong("Too many nodes");
    }

    Verdict::ok()
}

/// Upper-bound mode: any vertex cover passes; the score is the ratio of the
/// optimum to the achieved size (1.0 for an empty cover).
///
/// The ratio is deliberately left unclamped above 1.0: a cover smaller than
/// the claimed optimum should be impossible, and the reference harness does
/// not clamp it either.
pub fn check_ub(input: &Path, user_output: &Path, model_output: &Path) -> Verdict {
    let sol_size = try_wrong!(parse_solution_size(model_output));
    let vc = try_wrong!(parse_solution_set(user_output));
    let graph = try_wrong!(parse_graph(input, false));

    if let Err(verdict) = covers(&graph, &vc) {
        return verdict;
    }

    let score = if vc.is_empty() {
        1.0
    } else {
        sol_size as f64 / vc.len() as f64
    };
    Verdict::ok_scored(score)
}

/// Lower-bound mode: the contestant emits a single integer `L`; it must not
/// exceed the optimum. Score is `L / S` (1.0 when `S = 0`).
pub fn check_lb(user_output: &Path, model_output: &Path) -> Verdict {
    let sol_size = try_wrong!(parse_solution_size(model_output));

    let content = try_wrong!(std::fs::read_to_string(user_output).map_err(GraphError::from));
    let mut lb = None;
    for raw in content.lines() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<u64>() {
            Ok(value) => {
                lb = Some(value);
                break;
            }
            Err(_) => return Verdict::wrong("Can not read lower bound"),
        }
    }
    let lb = match lb {
        Some(lb) => lb,
        None => return Verdict::wrong("Can not read lower bound"),
    };

    if lb > sol_size as u64 {
        return Verdict::wrong("Lower bound is too large");
    }

    let score = if sol_size == 0 {
        1.0
    } else {
        lb as f64 / sol_size as f64
    };
    Verdict::ok_scored(score)
}

/// Kernelization mode: chains the reduced graph, the heuristic seed and the
/// lifted cover through the consistency checks of the kernel contract.
///
/// Fails when the claimed difference budget exceeds the optimum, when the
/// lifted cover overshoots the heuristic baseline plus the budget, or when
/// budget plus proven lower bound contradict the optimum. The score rewards
/// the fraction of the instance removed by the reduction.
pub fn check_kernel(
    input: &Path,
    user_output: &Path,
    model_output: &Path,
    heuristic_file: &Path,
    kernel_file: &Path,
) -> Verdict {
    let sol_size = try_wrong!(parse_solution_size(model_output)) as u64;

    let (n_original, m_original) = try_wrong!(parse_graph_header(input));
    let reduced = try_wrong!(parse_graph(kernel_file, true));

    let difference = match parse_difference(kernel_file) {
        Ok(d) => d,
        Err(_) => return Verdict::wrong("Can not read difference size"),
    };
    if difference > sol_size {
        return Verdict::wrong("Difference budget is too large");
    }

    let vc_heuristic = try_wrong!(parse_solution_set(heuristic_file));
    let vc_user = try_wrong!(parse_solution_set(user_output));

    let original = try_wrong!(parse_graph(input, false));
    if let Err(verdict) = covers(&original, &vc_user) {
        return verdict;
    }
    if vc_user.len() as u64 > vc_heuristic.len() as u64 + difference {
        return Verdict::wrong("Too many nodes");
    }

    let heuristic_lb = match parse_lower_bound(heuristic_file) {
        Ok(lb) => lb,
        Err(_) => {
            return Verdict::wrong("Inconsistencty in script/heu. Please report issue in forum")
        }
    };
    if difference + heuristic_lb > sol_size {
        return Verdict::wrong(
            "Graph incorrectly reduced. Opt for kernel + difference > opt for original graph",
        );
    }

    let original_size = (n_original + m_original) as f64;
    let score = if original_size == 0.0 {
        0.0
    } else {
        (1.0 - reduced.size() as f64 / original_size).max(0.0)
    };
    Verdict::ok_scored(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const TRIANGLE: &str = "3 3\na b\nb c\na c\n";

    #[test]
    fn test_exact_accepts_optimal_cover() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", TRIANGLE);
        let user = write(&temp, "user.txt", "a\nb\n");
        let model = write(&temp, "t.out", "2\n");

        let verdict = check_exact(&input, &user, &model);
        assert!(verdict.is_ok());
        assert_eq!(verdict.score, 0.0);
    }

    #[test]
    fn test_exact_rejects_uncovered_edge() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", TRIANGLE);
        let user = write(&temp, "user.txt", "a\n");
        let model = write(&temp, "t.out", "2\n");

        let verdict = check_exact(&input, &user, &model);
        assert_eq!(verdict.status, VerdictStatus::Wrong);
        assert_eq!(verdict.message, "Edge not covered");
    }

    #[test]
    fn test_exact_rejects_oversized_cover() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", TRIANGLE);
        let user = write(&temp, "user.txt", "a\nb\nc\n");
        let model = write(&temp, "t.out", "2\n");

        let verdict = check_exact(&input, &user, &model);
        assert_eq!(verdict.message, "Too many nodes");
    }

    #[test]
    fn test_exact_unreadable_model_size() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", TRIANGLE);
        let user = write(&temp, "user.txt", "a\nb\n");
        let model = write(&temp, "t.out", "# no number\n");

        let verdict = check_exact(&input, &user, &model);
        assert_eq!(verdict.status, VerdictStatus::Wrong);
        assert!(verdict.message.contains("solution size"));
    }

    #[test]
    fn test_ub_score_is_optimum_over_candidate() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", "4 2\na b\nc d\n");
        let user = write(&temp, "user.txt", "a\nb\nc\nd\n");
        let model = write(&temp, "t.out", "2\n");

        let verdict = check_ub(&input, &user, &model);
        assert!(verdict.is_ok());
        assert!((verdict.score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ub_score_one_at_optimum() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", TRIANGLE);
        let user = write(&temp, "user.txt", "a\nb\n");
        let model = write(&temp, "t.out", "2\n");

        let verdict = check_ub(&input, &user, &model);
        assert!((verdict.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ub_empty_cover_on_empty_graph() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", "0 0\n");
        let user = write(&temp, "user.txt", "");
        let model = write(&temp, "t.out", "0\n");

        let verdict = check_ub(&input, &user, &model);
        assert!(verdict.is_ok());
        assert_eq!(verdict.score, 1.0);
    }

    #[test]
    fn test_lb_score_ratio() {
        let temp = TempDir::new().unwrap();
        let user = write(&temp, "user.txt", "# my bound\n3\n");
        let model = write(&temp, "t.out", "4\n");

        let verdict = check_lb(&user, &model);
        assert!(verdict.is_ok());
        assert!((verdict.score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_lb_equal_to_optimum_scores_one() {
        let temp = TempDir::new().unwrap();
        let user = write(&temp, "user.txt", "4\n");
        let model = write(&temp, "t.out", "4\n");

        assert!((check_lb(&user, &model).score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_lb_above_optimum_rejected() {
        let temp = TempDir::new().unwrap();
        let user = write(&temp, "user.txt", "5\n");
        let model = write(&temp, "t.out", "4\n");

        let verdict = check_lb(&user, &model);
        assert_eq!(verdict.status, VerdictStatus::Wrong);
        assert_eq!(verdict.message, "Lower bound is too large");
    }

    #[test]
    fn test_lb_unparseable() {
        let temp = TempDir::new().unwrap();
        let user = write(&temp, "user.txt", "not-a-number\n");
        let model = write(&temp, "t.out", "4\n");

        let verdict = check_lb(&user, &model);
        assert_eq!(verdict.message, "Can not read lower bound");
    }

    #[test]
    fn test_lb_zero_optimum_scores_one() {
        let temp = TempDir::new().unwrap();
        let user = write(&temp, "user.txt", "0\n");
        let model = write(&temp, "t.out", "0\n");

        assert_eq!(check_lb(&user, &model).score, 1.0);
    }

    /// Scenario from the kernel contract: original (10, 20), reduced (4, 6),
    /// d = 1, heuristic cover of 6 with lower bound 5, optimum 6, lifted
    /// cover of 7. All consistency checks pass and the score is 1 - 10/30.
    #[test]
    fn test_kernel_happy_path() {
        let temp = TempDir::new().unwrap();
        let input = write(
            &temp,
            "t.in",
            "10 20\nv1 v2\nv2 v3\nv3 v4\nv4 v5\nv5 v6\nv6 v7\nv7 v1\n",
        );
        let model = write(&temp, "t.out", "6\n");
        let kernel = write(&temp, "k.txt", "4 6\n# difference: 1\nv1 v2\n");
        let heuristic = write(
            &temp,
            "h.txt",
            "# lower_bound: 5\nv1\nv2\nv3\nv4\nv5\nv6\n",
        );
        let user = write(&temp, "u.txt", "v1\nv2\nv3\nv4\nv5\nv6\nv7\n");

        let verdict = check_kernel(&input, &user, &model, &heuristic, &kernel);
        assert!(verdict.is_ok(), "unexpected: {}", verdict.message);
        assert!((verdict.score - (1.0 - 10.0 / 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_kernel_difference_exceeds_optimum() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", TRIANGLE);
        let model = write(&temp, "t.out", "2\n");
        let kernel = write(&temp, "k.txt", "1 0\n# difference: 3\n");
        let heuristic = write(&temp, "h.txt", "# lower_bound: 1\na\nb\n");
        let user = write(&temp, "u.txt", "a\nb\n");

        let verdict = check_kernel(&input, &user, &model, &heuristic, &kernel);
        assert_eq!(verdict.message, "Difference budget is too large");
    }

    #[test]
    fn test_kernel_lifted_cover_overshoots_budget() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", TRIANGLE);
        let model = write(&temp, "t.out", "2\n");
        let kernel = write(&temp, "k.txt", "1 0\n# difference: 0\n");
        let heuristic = write(&temp, "h.txt", "# lower_bound: 1\na\n");
        let user = write(&temp, "u.txt", "a\nb\n");

        let verdict = check_kernel(&input, &user, &model, &heuristic, &kernel);
        assert_eq!(verdict.message, "Too many nodes");
    }

    #[test]
    fn test_kernel_budget_plus_bound_contradiction() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", TRIANGLE);
        let model = write(&temp, "t.out", "2\n");
        let kernel = write(&temp, "k.txt", "1 0\n# difference: 1\n");
        let heuristic = write(&temp, "h.txt", "# lower_bound: 2\na\nb\n");
        let user = write(&temp, "u.txt", "a\nb\n");

        let verdict = check_kernel(&input, &user, &model, &heuristic, &kernel);
        assert!(verdict.message.starts_with("Graph incorrectly reduced"));
    }

    #[test]
    fn test_kernel_missing_difference_annotation() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", TRIANGLE);
        let model = write(&temp, "t.out", "2\n");
        let kernel = write(&temp, "k.txt", "1 0\n");
        let heuristic = write(&temp, "h.txt", "# lower_bound: 1\na\nb\n");
        let user = write(&temp, "u.txt", "a\nb\n");

        let verdict = check_kernel(&input, &user, &model, &heuristic, &kernel);
        assert_eq!(verdict.message, "Can not read difference size");
    }

    #[test]
    fn test_kernel_inconsistent_kernel_graph() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", TRIANGLE);
        let model = write(&temp, "t.out", "2\n");
        // Declares fewer edges than it lists.
        let kernel = write(&temp, "k.txt", "3 1\n# difference: 0\na b\nb c\n");
        let heuristic = write(&temp, "h.txt", "# lower_bound: 1\na\nb\n");
        let user = write(&temp, "u.txt", "a\nb\n");

        let verdict = check_kernel(&input, &user, &model, &heuristic, &kernel);
        assert_eq!(verdict.message, "Graph has wrong nodes or edge information");
    }

    #[test]
    fn test_kernel_score_floor_at_zero() {
        let temp = TempDir::new().unwrap();
        let input = write(&temp, "t.in", TRIANGLE);
        let model = write(&temp, "t.out", "2\n");
        // "Reduction" that grew the instance.
        let kernel = write(&temp, "k.txt", "10 20\n# difference: 0\n");
        let heuristic = write(&temp, "h.txt", "# lower_bound: 1\na\nb\n");
        let user = write(&temp, "u.txt", "a\nb\n");

        let verdict = check_kernel(&input, &user, &model, &heuristic, &kernel);
        assert!(verdict.is_ok());
        assert_eq!(verdict.score, 0.0);
    }
}
