// src/fix/all.rs - Every repair in one pass

use super::{find_orphans, fix_duplicate_paths, remove_missing, Analysis, FixOptions, MissingScan, OrphanReport, PathFix};
use crate::error::Result;
use crate::manifest::Manifest;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

pub const REMOVED_MISSING: &str = "removed missing";
pub const DUPLICATE_PATH: &str = "duplicate path";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixAllReport {
    /// Counts taken before any repair
    pub analysis: Analysis,
    pub missing: MissingScan,
    pub path_fixes: Vec<PathFix>,
    pub orphans: OrphanReport,
    pub fixes_by_type: BTreeMap<String, usize>,
}

impl FixAllReport {
    pub fn total_fixes(&self) -> usize {
        self.fixes_by_type.values().sum()
    }

    pub fn changed(&self) -> bool {
        self.total_fixes() > 0
    }
}

/// Remove missing references, then fix duplicate prefixes, then look for
/// orphans in the result.
pub fn fix_all(manifest: &Manifest, options: &FixOptions) -> Result<(Manifest, FixAllReport)> {
    let analysis = Analysis::of(manifest);
    info!(
        groups_with_paths = analysis.groups_with_paths,
        file_references = analysis.file_references,
        build_files = analysis.build_files,
        "analysed manifest"
    );

    let (manifest, missing) = remove_missing(manifest, options)?;
    let (manifest, path_fixes) = fix_duplicate_paths(&manifest, options.ownership)?;
    let orphans = find_orphans(&manifest, options)?;

    let mut fixes_by_type = BTreeMap::new();
    if !missing.missing.is_empty() {
        fixes_by_type.insert(REMOVED_MISSING.to_string(), missing.missing.len());
    }
    if !path_fixes.is_empty() {
        fixes_by_type.insert(DUPLICATE_PATH.to_string(), path_fixes.len());
    }

    let report = FixAllReport {
        analysis,
        missing,
        path_fixes,
        orphans,
        fixes_by_type,
    };
    info!(total = report.total_fixes(), "fix-all complete");
    Ok((manifest, report))
}
