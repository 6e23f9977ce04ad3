//! Parsing for the contest's text formats.
//!
//! Instances are undirected graphs in a DIMACS-like format: the first
//! significant line is `n m`, every following line is an edge `u v` with
//! free-form string node labels. A `#` starts a comment that runs to the end
//! of the line; blank lines are skipped. Solution files carry one node label
//! per significant line, or a single integer for bound outputs. Kernel and
//! heuristic files additionally embed tagged comment annotations
//! (`# difference: <d>`, `# lower_bound: <lb>`).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use regex::Regex;
use thiserror::Error;

/// Errors raised while reading instance or solution files.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Graph has wrong nodes or edge information")]
    InconsistentHeader,

    #[error("Malformed graph header in '{path}': expected 'n m', got '{line}'")]
    MalformedHeader { path: String, line: String },

    #[error("Malformed edge line in '{path}': '{line}'")]
    MalformedEdge { path: String, line: String },

    #[error("Empty graph file: {0}")]
    EmptyGraph(String),

    #[error("Can not read solution size from model output file")]
    MissingSolutionSize,

    #[error("Can not read difference size")]
    MissingDifference,

    #[error("Bad heu output. Report this issue in the forum. Thanks.")]
    MissingLowerBound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed instance graph.
///
/// `n` and `m` are the *declared* counts from the header; declarations may be
/// looser than the edge list implies, never tighter.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Declared node count.
    pub n: usize,
    /// Declared edge count.
    pub m: usize,
    /// Edge list in file order, as raw label pairs.
    pub edges: Vec<(String, String)>,
}

impl Graph {
    /// Combined declared size, the quantity the kernel score is based on.
    pub fn size(&self) -> usize {
        self.n + self.m
    }

    /// Checks whether `candidate` covers every edge.
    ///
    /// Returns the first uncovered edge, or `None` when the candidate is a
    /// valid vertex cover. The empty graph is covered by the empty set.
    pub fn uncovered_edge(&self, candidate: &HashSet<String>) -> Option<&(String, String)> {
        self.edges
            .iter()
            .find(|(u, v)| !candidate.contains(u) && !candidate.contains(v))
    }
}

/// Strips the `#`-comment suffix and surrounding whitespace from a line.
fn significant(line: &str) -> &str {
    line.split('#').next().unwrap_or("").trim()
}

/// Parses a full graph file.
///
/// With `check_consistency`, the realized node/edge counts are computed from
/// the edge list and the declared header must not undercut them. Both
/// orientations of every edge go into one set that is then halved, so
/// duplicate edges (and a lone self-loop) do not inflate the realized count.
pub fn parse_graph(path: &Path, check_consistency: bool) -> Result<Graph, GraphError> {
    let content = fs::read_to_string(path)?;

    let mut header: Option<(usize, usize)> = None;
    let mut edges = Vec::new();
    let mut nodes = HashSet::new();
    let mut oriented = HashSet::new();

    for raw in content.lines() {
        let line = significant(raw);
        if line.is_empty() {
            continue;
        }

        if header.is_none() {
            let mut words = line.split_whitespace();
            let n = words.next().and_then(|w| w.parse::<usize>().ok());
            let m = words.next().and_then(|w| w.parse::<usize>().ok());
            match (n, m) {
                (Some(n), Some(m)) => header = Some((n, m)),
                _ => {
                    return Err(GraphError::MalformedHeader {
                        path: path.display().to_string(),
                        line: line.to_string(),
                    })
                }
            }
        } else {
            let mut words = line.split_whitespace();
            let (u, v) = match (words.next(), words.next()) {
                (Some(u), Some(v)) => (u.to_string(), v.to_string()),
                _ => {
                    return Err(GraphError::MalformedEdge {
                        path: path.display().to_string(),
                        line: line.to_string(),
                    })
                }
            };
            nodes.insert(u.clone());
            nodes.insert(v.clone());
            oriented.insert((u.clone(), v.clone()));
            oriented.insert((v.clone(), u.clone()));
            edges.push((u, v));
        }
    }

    let (n, m) = header.ok_or_else(|| GraphError::EmptyGraph(path.display().to_string()))?;

    if check_consistency {
        let real_n = nodes.len();
        let real_m = oriented.len() / 2;
        if n < real_n || m < real_m {
            return Err(GraphError::InconsistentHeader);
        }
    }

    Ok(Graph { n, m, edges })
}

/// Reads only the declared `(n, m)` header, without scanning the edge list.
///
/// Used for the original instance in kernel mode where just the size is
/// needed for the reduction score.
pub fn parse_graph_header(path: &Path) -> Result<(usize, usize), GraphError> {
    let content = fs::read_to_string(path)?;

    for raw in content.lines() {
        let line = significant(raw);
        if line.is_empty() {
            continue;
        }
        let mut words = line.split_whitespace();
        let n = words.next().and_then(|w| w.parse::<usize>().ok());
        let m = words.next().and_then(|w| w.parse::<usize>().ok());
        return match (n, m) {
            (Some(n), Some(m)) => Ok((n, m)),
            _ => Err(GraphError::MalformedHeader {
                path: path.display().to_string(),
                line: line.to_string(),
            }),
        };
    }

    Err(GraphError::EmptyGraph(path.display().to_string()))
}

/// Reads a solution as a set of node labels, one per significant line.
pub fn parse_solution_set(path: &Path) -> Result<HashSet<String>, GraphError> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(significant)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Reads the optimal solution size: first token of the first significant line.
pub fn parse_solution_size(path: &Path) -> Result<usize, GraphError> {
    let content = fs::read_to_string(path)?;
    for raw in content.lines() {
        if raw.starts_with('#') || raw.trim().is_empty() {
            continue;
        }
        let mut words = raw.split_whitespace();
        return match words.next().and_then(|w| w.parse::<usize>().ok()) {
            Some(size) => Ok(size),
            None => Err(GraphError::MissingSolutionSize),
        };
    }
    Err(GraphError::MissingSolutionSize)
}

/// Scans a kernel file for its `# difference: <d>` annotation.
pub fn parse_difference(path: &Path) -> Result<u64, GraphError> {
    scan_annotation(path, r"#\s*difference:\s*(\d+)").ok_or(GraphError::MissingDifference)
}

/// Scans a heuristic output for its `# lower_bound: <lb>` annotation.
pub fn parse_lower_bound(path: &Path) -> Result<u64, GraphError> {
    scan_annotation(path, r"#\s*lower_bound[:]?\s*(\d+)").ok_or(GraphError::MissingLowerBound)
}

/// Matches a tagged comment annotation anywhere in the file.
///
/// The tags are case-sensitive, mirroring the reference checker.
fn scan_annotation(path: &Path, pattern: &str) -> Option<u64> {
    let content = fs::read_to_string(path).ok()?;
    let re = Regex::new(pattern).expect("annotation pattern is valid");
    re.captures(&content)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
}
