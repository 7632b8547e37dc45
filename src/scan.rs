// src/scan.rs - Source file discovery under the project root

use crate::error::Result;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Files found by [`source_files`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    /// Root-relative paths with `/` separators, sorted per directory
    pub files: Vec<String>,
    /// Requested directories that do not exist
    pub missing_dirs: Vec<String>,
}

/// Walk `dirs` (relative to `root`) for files whose extension is in
/// `extensions`.
///
/// Hidden entries, project bundles (`*.xcodeproj`, `*.xcworkspace`) and
/// build output directories are not descended into.
pub fn source_files(root: &Path, dirs: &[String], extensions: &[String]) -> Result<Scan> {
    let mut scan = Scan::default();

    for dir in dirs {
        let base = root.join(dir);
        if !base.is_dir() {
            warn!(dir = %dir, "source directory not found");
            scan.missing_dirs.push(dir.clone());
            continue;
        }

        let walker = WalkDir::new(&base)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped(&e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !extensions.iter().any(|wanted| wanted.trim_start_matches('.') == ext) {
                continue;
            }
            if let Some(relative) = relative_path(root, path) {
                if !scan.files.contains(&relative) {
                    scan.files.push(relative);
                }
            }
        }
    }

    debug!(files = scan.files.len(), "scanned source directories");
    Ok(scan)
}

fn is_skipped(name: &str) -> bool {
    name.starts_with('.')
        || name.ends_with(".xcodeproj")
        || name.ends_with(".xcworkspace")
        || matches!(name, "build" | "DerivedData" | "Pods")
}

/// `path` relative to `root`, `/` separated, without a leading `./`.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
