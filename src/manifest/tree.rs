// src/manifest/tree.rs - Parent links of the group hierarchy

use super::{Manifest, Record};
use std::collections::{HashMap, HashSet};

/// Child to parent map over every group kind.
///
/// A child listed by several groups keeps the first parent encountered.
#[derive(Debug, Clone, Default)]
pub struct GroupTree {
    parent: HashMap<String, String>,
    reachable: HashSet<String>,
}

impl GroupTree {
    pub fn build(manifest: &Manifest) -> Self {
        let mut parent = HashMap::new();
        for group in manifest.groups() {
            if let Some(children) = group.list("children") {
                for child in children.ids() {
                    parent
                        .entry(child.to_string())
                        .or_insert_with(|| group.id.clone());
                }
            }
        }

        let mut reachable = HashSet::new();
        let main_group = manifest
            .project()
            .and_then(|p| p.scalar("mainGroup"))
            .map(str::to_string);
        let mut stack: Vec<String> = main_group.into_iter().collect();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id.clone()) {
                continue;
            }
            if let Some(children) = manifest.record(&id).and_then(|r| r.list("children")) {
                stack.extend(children.ids().map(str::to_string));
            }
        }

        Self { parent, reachable }
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parent.get(id).map(String::as_str)
    }

    /// Enclosing groups, nearest first. Stops on a cycle.
    pub fn ancestors<'a>(&'a self, id: &str) -> Vec<&'a str> {
        let mut out: Vec<&str> = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(group) = current {
            if out.contains(&group) {
                break;
            }
            out.push(group);
            current = self.parent_of(group);
        }
        out
    }

    /// Whether `id` hangs under the project's main group.
    pub fn is_reachable(&self, id: &str) -> bool {
        self.reachable.contains(id)
    }

    /// Joined declared paths of `group_id` and every group enclosing it.
    ///
    /// Stops climbing at a group that is not project relative. Empty when no
    /// group on the way declares a path.
    pub fn prefix_of(&self, manifest: &Manifest, group_id: &str) -> String {
        let mut parts = Vec::new();
        let chain = std::iter::once(group_id).chain(self.ancestors(group_id));
        for id in chain {
            let Some(group) = manifest.record(id) else {
                break;
            };
            if let Some(path) = group.group_path() {
                parts.push(path);
            }
            if group.scalar("sourceTree").is_some_and(|t| t != "<group>") {
                break;
            }
        }
        parts.reverse();
        parts.join("/")
    }

    /// Path of `record` relative to the project root, joining the declared
    /// paths of every enclosing group.
    ///
    /// Returns `None` when the record has no `path`.
    pub fn resolved_path(&self, manifest: &Manifest, record: &Record) -> Option<String> {
        let own = record.scalar("path")?;
        if record.scalar("sourceTree").is_some_and(|t| t != "<group>") {
            return Some(own.to_string());
        }
        let prefix = self
            .parent_of(&record.id)
            .map(|parent| self.prefix_of(manifest, parent))
            .unwrap_or_default();
        if prefix.is_empty() {
            Some(own.to_string())
        } else {
            Some(format!("{prefix}/{own}"))
        }
    }
}
