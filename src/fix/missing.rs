// src/fix/missing.rs - Dropping references to files that no longer exist

use super::{build_files_by_ref, groups_with_paths, FixOptions};
use crate::error::Result;
use crate::manifest::{isa, Dict, GroupTree, Manifest, Record, Value};
use crate::splice::{collapse_blank_lines, expand_to_lines, EditSet};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of checking one file reference against the disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Found at this root-relative location
    Exists(String),
    /// Bundle-like path, assumed present
    Bundle,
    /// Not project relative, or without a path
    Skipped,
    Missing,
}

/// A file reference whose file is gone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingRef {
    pub id: String,
    pub path: String,
    /// Build files joining this reference to a phase
    pub build_files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissingScan {
    pub checked: usize,
    pub existing: usize,
    pub bundles: usize,
    pub skipped: usize,
    pub missing: Vec<MissingRef>,
}

impl MissingScan {
    /// Every identifier that disappears when the missing references go.
    pub fn doomed_ids(&self) -> HashSet<String> {
        self.missing
            .iter()
            .flat_map(|m| std::iter::once(m.id.clone()).chain(m.build_files.iter().cloned()))
            .collect()
    }
}

// ============================================================================
// EXISTENCE CHECK
// ============================================================================

/// Check one file reference.
///
/// Tried in order: the stored path under the root, the tree-resolved path,
/// then the stored path under each path-bearing group's declared path.
pub fn presence(
    manifest: &Manifest,
    tree: &GroupTree,
    group_paths: &[String],
    record: &Record,
    options: &FixOptions,
) -> Presence {
    let Some(path) = record.scalar("path") else {
        return Presence::Skipped;
    };
    if record
        .scalar("sourceTree")
        .is_some_and(|t| options.skip_source_trees.iter().any(|s| s == t))
    {
        return Presence::Skipped;
    }
    if is_bundle(path, &options.bundle_suffixes) {
        return Presence::Bundle;
    }

    let mut candidates = vec![path.to_string()];
    if let Some(resolved) = tree.resolved_path(manifest, record) {
        candidates.push(resolved);
    }
    candidates.extend(group_paths.iter().map(|group| format!("{group}/{path}")));

    candidates
        .into_iter()
        .find(|candidate| exists(&options.root, candidate))
        .map(Presence::Exists)
        .unwrap_or(Presence::Missing)
}

fn exists(root: &Path, relative: &str) -> bool {
    root.join(relative).exists()
}

/// Whether any component of `path` carries a bundle suffix.
pub fn is_bundle(path: &str, suffixes: &[String]) -> bool {
    path.split('/')
        .any(|part| suffixes.iter().any(|suffix| part.ends_with(suffix.as_str())))
}

/// Classify every file reference.
pub fn scan_missing(manifest: &Manifest, options: &FixOptions) -> MissingScan {
    let tree = GroupTree::build(manifest);
    let group_paths: Vec<String> = groups_with_paths(manifest)
        .into_iter()
        .map(|(_, path)| path)
        .collect();
    let build_files = build_files_by_ref(manifest);

    let mut scan = MissingScan::default();
    for record in manifest.records_of(isa::FILE_REFERENCE) {
        scan.checked += 1;
        match presence(manifest, &tree, &group_paths, record, options) {
            Presence::Exists(found) => {
                debug!(id = %record.id, found = %found, "file exists");
                scan.existing += 1;
            }
            Presence::Bundle => scan.bundles += 1,
            Presence::Skipped => scan.skipped += 1,
            Presence::Missing => {
                let path = record.scalar("path").unwrap_or_default().to_string();
                warn!(id = %record.id, path = %path, "referenced file is missing");
                scan.missing.push(MissingRef {
                    id: record.id.clone(),
                    path,
                    build_files: build_files.get(&record.id).cloned().unwrap_or_default(),
                });
            }
        }
    }
    scan
}

// ============================================================================
// REMOVAL
// ============================================================================

/// Edits deleting every record in `doomed`, every list entry naming one of
/// them, and every field whose value is one of them.
pub fn plan_removal(manifest: &Manifest, doomed: &HashSet<String>) -> EditSet {
    let text = manifest.text();
    let mut edits = EditSet::new();
    for record in manifest.records() {
        if doomed.contains(&record.id) {
            edits.delete(expand_to_lines(text, record.span.clone()));
        } else {
            strip_references(text, &record.body, doomed, &mut edits);
        }
    }
    edits
}

fn strip_references(text: &str, dict: &Dict, doomed: &HashSet<String>, edits: &mut EditSet) {
    for field in &dict.fields {
        match &field.value {
            Value::Scalar(scalar) if doomed.contains(&scalar.text) => {
                edits.delete(expand_to_lines(text, field.span.clone()));
            }
            Value::Scalar(_) => {}
            Value::List(list) => {
                for item in &list.items {
                    match &item.value {
                        Value::Scalar(s) if doomed.contains(&s.text) => {
                            edits.delete(expand_to_lines(text, item.span.clone()));
                        }
                        Value::Dict(inner) => strip_references(text, inner, doomed, edits),
                        _ => {}
                    }
                }
            }
            Value::Dict(inner) => strip_references(text, inner, doomed, edits),
        }
    }
}

/// Remove every reference to a missing file, together with its build files
/// and every list entry naming either.
pub fn remove_missing(manifest: &Manifest, options: &FixOptions) -> Result<(Manifest, MissingScan)> {
    let scan = scan_missing(manifest, options);
    if scan.missing.is_empty() {
        return Ok((manifest.clone(), scan));
    }

    let doomed = scan.doomed_ids();
    let edits = plan_removal(manifest, &doomed);
    let text = collapse_blank_lines(&edits.apply(manifest.text())?);
    let result = Manifest::parse(text)?;

    for id in &doomed {
        if result.mentions(id) {
            warn!(id = %id, "identifier still mentioned after removal");
        }
    }
    for missing in &scan.missing {
        info!(path = %missing.path, build_files = missing.build_files.len(), "removed missing reference");
    }
    Ok((result, scan))
}
