// src/fix/orphans.rs - Files on disk that the manifest never mentions

use super::{referenced_paths, FixOptions};
use crate::error::Result;
use crate::manifest::{GroupTree, Manifest};
use crate::scan;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
    pub scanned: usize,
    /// Root-relative paths with no file reference
    pub orphans: Vec<String>,
    pub missing_dirs: Vec<String>,
}

/// Report source files under the configured directories that no file
/// reference stores, directly or through its enclosing groups' paths.
pub fn find_orphans(manifest: &Manifest, options: &FixOptions) -> Result<OrphanReport> {
    let scan = scan::source_files(&options.root, &options.source_dirs, &options.source_extensions)?;
    let tree = GroupTree::build(manifest);
    let known = referenced_paths(manifest, &tree);

    let scanned = scan.files.len();
    let orphans: Vec<String> = scan
        .files
        .into_iter()
        .filter(|file| !known.contains(file))
        .collect();

    info!(scanned, orphans = orphans.len(), "orphan scan complete");
    Ok(OrphanReport {
        scanned,
        orphans,
        missing_dirs: scan.missing_dirs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::SAMPLE;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_orphans() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Managers")).unwrap();
        fs::create_dir_all(root.join("Libraries/CurrencyPicker")).unwrap();
        fs::write(root.join("AppDelegate.swift"), "").unwrap();
        fs::write(root.join("Managers/ApplePlacesManager.swift"), "").unwrap();
        fs::write(root.join("Libraries/CurrencyPicker/CurrencyAdapter.swift"), "").unwrap();

        let options = FixOptions {
            root: root.to_path_buf(),
            ..FixOptions::default()
        };
        let report = find_orphans(&Manifest::parse(SAMPLE).unwrap(), &options).unwrap();

        assert_eq!(report.scanned, 3);
        assert_eq!(report.orphans, vec!["Managers/ApplePlacesManager.swift"]);
    }
}
