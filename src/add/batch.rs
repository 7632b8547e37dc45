// src/add/batch.rs - Registering every new file found under some directories

use super::{add_files, FileAddition, FileSpec};
use crate::error::Result;
use crate::fix;
use crate::locator;
use crate::manifest::{GroupTree, Manifest, PhaseKind};
use crate::scan;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Directories to scan and where their files go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSpec {
    /// Directories relative to the project root
    pub dirs: Vec<String>,

    /// Owning group; the main group when absent or unknown
    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub target: Option<String>,

    #[serde(default = "default_batch_extensions")]
    pub extensions: Vec<String>,

    /// Maximum number of files registered per run
    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub phase: PhaseKind,
}

fn default_batch_extensions() -> Vec<String> {
    vec!["swift".to_string()]
}

impl BatchSpec {
    pub fn new(dirs: Vec<String>) -> Self {
        Self {
            dirs,
            group: None,
            target: None,
            extensions: default_batch_extensions(),
            limit: None,
            phase: PhaseKind::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Files found on disk
    pub found: usize,
    /// Root-relative paths already known to the manifest
    pub already_referenced: Vec<String>,
    pub additions: Vec<FileAddition>,
    pub missing_dirs: Vec<String>,
    /// Files left for a later run because of the limit
    pub deferred: usize,
}

impl BatchReport {
    pub fn changed(&self) -> bool {
        self.additions.iter().any(FileAddition::changed)
    }
}

/// Scan `spec.dirs` under `root` and register every file the manifest does
/// not reference yet.
pub fn add_batch(manifest: Manifest, root: &Path, spec: &BatchSpec) -> Result<(Manifest, BatchReport)> {
    let scan = scan::source_files(root, &spec.dirs, &spec.extensions)?;
    let mut report = BatchReport {
        found: scan.files.len(),
        missing_dirs: scan.missing_dirs,
        ..BatchReport::default()
    };

    let tree = GroupTree::build(&manifest);
    let known = fix::referenced_paths(&manifest, &tree);
    let group = locator::group_or_main(&manifest, spec.group.as_deref());
    let prefix = group
        .map(|group| tree.prefix_of(&manifest, &group.id))
        .unwrap_or_default();
    // An unknown group name has already fallen back to the main group
    let group_name = spec
        .group
        .clone()
        .filter(|name| locator::group_by_name(&manifest, name).is_some());

    let mut specs = Vec::new();
    for file in scan.files {
        let stored = strip_prefix(&file, &prefix);
        if known.contains(&file) || known.contains(stored) {
            report.already_referenced.push(file);
            continue;
        }
        if spec.limit.is_some_and(|limit| specs.len() >= limit) {
            report.deferred += 1;
            continue;
        }
        let mut file_spec = FileSpec::new(stored).with_phase(spec.phase);
        file_spec.group = group_name.clone();
        file_spec.target = spec.target.clone();
        specs.push(file_spec);
    }

    info!(
        found = report.found,
        new = specs.len(),
        deferred = report.deferred,
        "batch scan complete"
    );

    let (manifest, added) = add_files(manifest, &specs)?;
    report.additions = added.additions;
    Ok((manifest, report))
}

fn strip_prefix<'p>(path: &'p str, prefix: &str) -> &'p str {
    if prefix.is_empty() {
        return path;
    }
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::SAMPLE;
    use crate::add::StepOutcome;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let lib = dir.path().join("Libraries/WishKit");
        fs::create_dir_all(&lib).unwrap();
        fs::create_dir_all(dir.path().join("Libraries/CurrencyPicker")).unwrap();
        fs::write(lib.join("WishView.swift"), "").unwrap();
        fs::write(lib.join("WishModel.swift"), "").unwrap();
        fs::write(dir.path().join("Libraries/CurrencyPicker/CurrencyAdapter.swift"), "").unwrap();
        dir
    }

    #[test]
    fn test_batch_strips_group_prefix_and_skips_known() {
        let dir = project();
        let mut spec = BatchSpec::new(vec!["Libraries".to_string()]);
        spec.group = Some("Libraries".to_string());
        let (manifest, report) =
            add_batch(Manifest::parse(SAMPLE).unwrap(), dir.path(), &spec).unwrap();

        assert_eq!(report.found, 3);
        assert_eq!(
            report.already_referenced,
            vec!["Libraries/CurrencyPicker/CurrencyAdapter.swift"]
        );
        let paths: Vec<_> = report.additions.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["WishKit/WishModel.swift", "WishKit/WishView.swift"]);

        let libraries = manifest.record("C10000000000000000000003").unwrap();
        for addition in &report.additions {
            assert!(libraries.list("children").unwrap().contains(&addition.file_ref_id));
        }
    }

    #[test]
    fn test_batch_limit_defers_the_rest() {
        let dir = project();
        let mut spec = BatchSpec::new(vec!["Libraries/WishKit".to_string()]);
        spec.limit = Some(1);
        let (_, report) = add_batch(Manifest::parse(SAMPLE).unwrap(), dir.path(), &spec).unwrap();
        assert_eq!(report.additions.len(), 1);
        assert_eq!(report.deferred, 1);
    }

    #[test]
    fn test_batch_unknown_group_lands_in_main_group() {
        let dir = project();
        let mut spec = BatchSpec::new(vec!["Libraries/WishKit".to_string()]);
        spec.group = Some("Packages".to_string());
        let (manifest, report) = add_batch(Manifest::parse(SAMPLE).unwrap(), dir.path(), &spec).unwrap();

        let main = locator::main_group(&manifest).unwrap();
        assert_eq!(report.additions.len(), 2);
        for addition in &report.additions {
            assert_eq!(addition.group_child, StepOutcome::Added);
            assert!(main.list("children").unwrap().contains(&addition.file_ref_id));
        }
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("Libraries/A.swift", "Libraries"), "A.swift");
        assert_eq!(strip_prefix("LibrariesX/A.swift", "Libraries"), "LibrariesX/A.swift");
        assert_eq!(strip_prefix("A.swift", ""), "A.swift");
    }
}
