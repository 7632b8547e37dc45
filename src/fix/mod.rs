// src/fix/mod.rs - Repairs for manifests that drifted from the file tree
//
// Each repair plans its edits against one parsed manifest and returns the
// re-parsed result together with a report. Nothing here touches the disk
// except for existence checks and directory scans.

pub mod all;
pub mod missing;
pub mod orphans;
pub mod paths;

pub use all::{fix_all, FixAllReport};
pub use missing::{remove_missing, scan_missing, MissingRef, MissingScan, Presence};
pub use orphans::{find_orphans, OrphanReport};
pub use paths::{fix_duplicate_paths, plan_path_fixes, PathFix};

use crate::error::PatchError;
use crate::manifest::{isa, GroupTree, Manifest};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ============================================================================
// OPTIONS
// ============================================================================

/// How a file reference is matched to the group whose path it duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    /// Enclosing groups in the group tree, nearest first
    #[default]
    Tree,
    /// Any path-bearing group, in manifest order
    Prefix,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ownership::Tree => f.write_str("tree"),
            Ownership::Prefix => f.write_str("prefix"),
        }
    }
}

impl FromStr for Ownership {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tree" => Ok(Ownership::Tree),
            "prefix" => Ok(Ownership::Prefix),
            other => Err(PatchError::Config(format!(
                "unknown ownership mode '{other}' (expected tree or prefix)"
            ))),
        }
    }
}

/// Inputs shared by the repairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOptions {
    /// Project root; stored paths resolve against it
    pub root: PathBuf,
    pub ownership: Ownership,
    /// Path components ending in one of these always count as existing
    pub bundle_suffixes: Vec<String>,
    /// `sourceTree` values whose references are not checked
    pub skip_source_trees: Vec<String>,
    /// Directories scanned for unreferenced files
    pub source_dirs: Vec<String>,
    pub source_extensions: Vec<String>,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            ownership: Ownership::default(),
            bundle_suffixes: crate::config::default_bundle_suffixes(),
            skip_source_trees: crate::config::default_skip_source_trees(),
            source_dirs: crate::config::default_source_dirs(),
            source_extensions: crate::config::default_source_extensions(),
        }
    }
}

// ============================================================================
// ANALYSIS
// ============================================================================

/// Counts gathered before any repair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub groups_with_paths: usize,
    pub file_references: usize,
    pub build_files: usize,
}

impl Analysis {
    pub fn of(manifest: &Manifest) -> Self {
        Self {
            groups_with_paths: groups_with_paths(manifest).len(),
            file_references: file_references(manifest).len(),
            build_files: manifest.records_of(isa::BUILD_FILE).count(),
        }
    }
}

/// `(group id, declared path)` for every `PBXGroup` with a non-trivial
/// path, in manifest order.
pub fn groups_with_paths(manifest: &Manifest) -> Vec<(String, String)> {
    manifest
        .records_of(isa::GROUP)
        .filter_map(|g| g.group_path().map(|p| (g.id.clone(), p.to_string())))
        .collect()
}

/// `(file reference id, stored path)` in manifest order.
pub fn file_references(manifest: &Manifest) -> Vec<(String, String)> {
    manifest
        .records_of(isa::FILE_REFERENCE)
        .filter_map(|r| r.scalar("path").map(|p| (r.id.clone(), p.to_string())))
        .collect()
}

/// Build file ids keyed by the file reference they join.
pub fn build_files_by_ref(manifest: &Manifest) -> HashMap<String, Vec<String>> {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for build_file in manifest.records_of(isa::BUILD_FILE) {
        if let Some(file_ref) = build_file.scalar("fileRef") {
            map.entry(file_ref.to_string())
                .or_default()
                .push(build_file.id.clone());
        }
    }
    map
}

/// Stored and tree-resolved paths of every file reference.
pub fn referenced_paths(manifest: &Manifest, tree: &GroupTree) -> HashSet<String> {
    let mut known = HashSet::new();
    for record in manifest.records_of(isa::FILE_REFERENCE) {
        if let Some(path) = record.scalar("path") {
            known.insert(path.to_string());
        }
        if let Some(resolved) = tree.resolved_path(manifest, record) {
            known.insert(resolved);
        }
    }
    known
}
