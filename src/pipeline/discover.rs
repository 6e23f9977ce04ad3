//! Instance discovery and grouping.
//!
//! Instances are the `*.in` files of the input directory, processed in
//! lexicographic order. Files sharing a numeric filename prefix form a
//! retry/variant group with a shared timeout budget; when every group is a
//! singleton the grouping carries no information and all instances run as
//! one flat group.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

/// A batch of instances sharing a timeout budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceGroup {
    /// Numeric prefix shared by the group's files (0 when digit-free).
    pub id: u64,
    /// Instance file names, lexicographically ordered.
    pub files: Vec<String>,
}

/// Extracts the grouping key: all digits of the filename, concatenated.
///
/// `"003_planar2.in"` yields 32; a digit-free name yields 0.
pub fn numeric_prefix(filename: &str) -> u64 {
    let digits: String = filename.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Lists `*.in` files and groups them by numeric prefix.
///
/// Groups appear in order of first appearance over the sorted file list. If
/// no two files share a prefix, everything collapses into one flat group.
pub fn discover_groups(input_dir: &Path) -> io::Result<Vec<InstanceGroup>> {
    let mut files: Vec<String> = fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".in"))
        .collect();
    files.sort();

    let mut groups: Vec<InstanceGroup> = Vec::new();
    let mut flatten = true;
    for file in &files {
        let id = numeric_prefix(file);
        match groups.iter_mut().find(|g| g.id == id) {
            Some(group) => {
                flatten = false;
                group.files.push(file.clone());
            }
            None => groups.push(InstanceGroup {
                id,
                files: vec![file.clone()],
            }),
        }
    }

    if flatten && !files.is_empty() {
        debug!("All {} instances are singleton groups; flattening", files.len());
        return Ok(vec![InstanceGroup { id: 0, files }]);
    }

    debug!("Discovered {} instance groups", groups.len());
    Ok(groups)
}

/// Maps an instance file name to its reference-output name.
pub fn reference_name(instance: &str) -> String {
    match instance.strip_suffix(".in") {
        Some(stem) => format!("{}.out", stem),
        None => instance.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, names: &[&str]) {
        for name in names {
            fs::write(dir.path().join(name), "").unwrap();
        }
    }

    #[test]
    fn test_numeric_prefix_concatenates_digits() {
        assert_eq!(numeric_prefix("003_planar2.in"), 32);
        assert_eq!(numeric_prefix("12_dense.in"), 12);
        assert_eq!(numeric_prefix("nodigits.in"), 0);
    }

    #[test]
    fn test_groups_by_prefix() {
        let temp = TempDir::new().unwrap();
        touch(&temp, &["1_a.in", "1_b.in", "2_a.in", "readme.txt"]);

        let groups = discover_groups(temp.path()).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id, 1);
        assert_eq!(groups[0].files, vec!["1_a.in", "1_b.in"]);
        assert_eq!(groups[1].files, vec!["2_a.in"]);
    }

    #[test]
    fn test_flattens_when_all_singletons() {
        let temp = TempDir::new().unwrap();
        touch(&temp, &["1.in", "2.in", "3.in"]);

        let groups = discover_groups(temp.path()).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files, vec!["1.in", "2.in", "3.in"]);
    }

    #[test]
    fn test_group_order_follows_sorted_files() {
        let temp = TempDir::new().unwrap();
        // Lexicographically "10_..." sorts before "2_...".
        touch(&temp, &["10_a.in", "10_b.in", "2_a.in", "2_b.in"]);

        let groups = discover_groups(temp.path()).unwrap();
        assert_eq!(groups[0].id, 10);
        assert_eq!(groups[1].id, 2);
    }

    #[test]
    fn test_ignores_non_instance_files() {
        let temp = TempDir::new().unwrap();
        touch(&temp, &["a.in", "a.out", "notes.md"]);

        let groups = discover_groups(temp.path()).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files, vec!["a.in"]);
    }

    #[test]
    fn test_reference_name() {
        assert_eq!(reference_name("5_sparse.in"), "5_sparse.out");
    }
}
