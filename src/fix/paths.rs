// src/fix/paths.rs - Stripping path prefixes that repeat a parent group's path
//
// A file stored as `Libraries/CurrencyPicker/CurrencyAdapter.swift` inside a
// group declaring `path = Libraries;` resolves to
// `Libraries/Libraries/CurrencyPicker/...` on disk. The fix rewrites the
// stored path to `CurrencyPicker/CurrencyAdapter.swift`.

use super::{file_references, groups_with_paths, Ownership};
use crate::error::Result;
use crate::manifest::{render_scalar, GroupTree, Manifest};
use crate::splice::EditSet;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// One rewritten file reference path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathFix {
    pub file_ref_id: String,
    pub old: String,
    pub new: String,
    /// Declared path of the group the prefix was matched against
    pub group: String,
}

/// Find every file reference whose stored path starts with the path of the
/// group that owns it.
///
/// One pass strips one prefix. A stored path that repeats the group path
/// twice (`Lib/Lib/A.swift`) becomes `Lib/A.swift` and is fixed again by
/// the next pass.
pub fn plan_path_fixes(manifest: &Manifest, ownership: Ownership) -> Vec<PathFix> {
    let groups = groups_with_paths(manifest);
    let group_paths: HashMap<&str, &str> = groups
        .iter()
        .map(|(id, path)| (id.as_str(), path.as_str()))
        .collect();
    let tree = GroupTree::build(manifest);

    let mut fixes = Vec::new();
    for (id, path) in file_references(manifest) {
        let candidates: Vec<&str> = match ownership {
            Ownership::Tree if tree.is_reachable(&id) => tree
                .ancestors(&id)
                .into_iter()
                .filter_map(|group| group_paths.get(group).copied())
                .collect(),
            _ => groups.iter().map(|(_, p)| p.as_str()).collect(),
        };

        let matched = candidates.into_iter().find_map(|group_path| {
            path.strip_prefix(group_path)
                .and_then(|rest| rest.strip_prefix('/'))
                .filter(|rest| !rest.is_empty())
                .map(|rest| (group_path, rest.to_string()))
        });

        if let Some((group_path, new)) = matched {
            debug!(id = %id, old = %path, new = %new, group = group_path, "duplicate prefix");
            fixes.push(PathFix {
                file_ref_id: id,
                old: path,
                new,
                group: group_path.to_string(),
            });
        }
    }
    fixes
}

/// Apply planned fixes. A fix whose stored path no longer matches its `old`
/// value is skipped.
pub fn apply_path_fixes(manifest: &Manifest, fixes: Vec<PathFix>) -> Result<(Manifest, Vec<PathFix>)> {
    let mut edits = EditSet::new();
    let mut applied = Vec::with_capacity(fixes.len());

    for fix in fixes {
        let field = manifest
            .record(&fix.file_ref_id)
            .and_then(|r| r.field("path"));
        let Some(scalar) = field.and_then(|f| f.value.as_scalar()) else {
            debug!(id = %fix.file_ref_id, "file reference gone, skipping");
            continue;
        };
        if scalar.text != fix.old {
            debug!(id = %fix.file_ref_id, "stored path changed, skipping");
            continue;
        }
        edits.replace(scalar.span.clone(), render_scalar(&fix.new, scalar.quoted));
        info!(old = %fix.old, new = %fix.new, "fixed duplicate path prefix");
        applied.push(fix);
    }

    if edits.is_empty() {
        return Ok((manifest.clone(), applied));
    }
    Ok((manifest.edit(&edits)?, applied))
}

/// Plan and apply in one step.
pub fn fix_duplicate_paths(manifest: &Manifest, ownership: Ownership) -> Result<(Manifest, Vec<PathFix>)> {
    let fixes = plan_path_fixes(manifest, ownership);
    apply_path_fixes(manifest, fixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::SAMPLE;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fix_strips_group_prefix() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        let (fixed, fixes) = fix_duplicate_paths(&manifest, Ownership::Tree).unwrap();

        assert_eq!(
            fixes,
            vec![PathFix {
                file_ref_id: "B10000000000000000000002".to_string(),
                old: "Libraries/CurrencyPicker/CurrencyAdapter.swift".to_string(),
                new: "CurrencyPicker/CurrencyAdapter.swift".to_string(),
                group: "Libraries".to_string(),
            }]
        );
        assert!(fixed
            .text()
            .contains("path = \"CurrencyPicker/CurrencyAdapter.swift\"; sourceTree"));
        assert_eq!(fixed.text().len(), SAMPLE.len() - "Libraries/".len());
    }

    #[test]
    fn test_fix_is_idempotent() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        let (once, _) = fix_duplicate_paths(&manifest, Ownership::Tree).unwrap();
        let (twice, fixes) = fix_duplicate_paths(&once, Ownership::Tree).unwrap();
        assert!(fixes.is_empty());
        assert_eq!(once.text(), twice.text());
    }

    #[test]
    fn test_tree_mode_ignores_unrelated_groups() {
        // Managers/Legacy.swift sits in a group without a path; a Managers
        // group elsewhere must not claim it.
        let text = SAMPLE.replace(
            "\t\t\tname = Products;",
            "\t\t\tpath = Managers;",
        );
        let manifest = Manifest::parse(text).unwrap();

        let tree_fixes = plan_path_fixes(&manifest, Ownership::Tree);
        assert!(tree_fixes.iter().all(|f| f.file_ref_id != "B10000000000000000000003"));

        let prefix_fixes = plan_path_fixes(&manifest, Ownership::Prefix);
        assert!(prefix_fixes
            .iter()
            .any(|f| f.file_ref_id == "B10000000000000000000003" && f.new == "Legacy.swift"));
    }

    #[test]
    fn test_repeated_prefix_is_stripped_once_per_pass() {
        let text = SAMPLE.replace(
            "\"Libraries/CurrencyPicker/CurrencyAdapter.swift\"",
            "Libraries/Libraries/CurrencyAdapter.swift",
        );
        let manifest = Manifest::parse(text).unwrap();

        let (once, fixes) = fix_duplicate_paths(&manifest, Ownership::Tree).unwrap();
        assert_eq!(fixes[0].new, "Libraries/CurrencyAdapter.swift");
        let (twice, fixes) = fix_duplicate_paths(&once, Ownership::Tree).unwrap();
        assert_eq!(fixes[0].new, "CurrencyAdapter.swift");
        let (_, fixes) = fix_duplicate_paths(&twice, Ownership::Tree).unwrap();
        assert!(fixes.is_empty());
    }

    #[test]
    fn test_stale_fix_is_skipped() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        let stale = PathFix {
            file_ref_id: "B10000000000000000000001".to_string(),
            old: "Somewhere/AppDelegate.swift".to_string(),
            new: "AppDelegate.swift".to_string(),
            group: "Somewhere".to_string(),
        };
        let (same, applied) = apply_path_fixes(&manifest, vec![stale]).unwrap();
        assert!(applied.is_empty());
        assert_eq!(same.text(), SAMPLE);
    }
}
