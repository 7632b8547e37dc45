// src/locator.rs - Finding records and insertion points in a parsed manifest

use crate::manifest::{isa, Manifest, PhaseKind, Record};
use crate::splice::{indent_at, line_end, line_start, EditSet};
use tracing::{debug, warn};

/// What an insertion is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker<'a> {
    /// `/* Begin <name> section */`
    Section(&'a str),
    /// A record whose annotation (or `name`/`path`) matches, optionally
    /// restricted to one `isa`
    Named { name: &'a str, isa: Option<&'a str> },
    /// A record by identifier
    Id(&'a str),
}

/// Where, and how indented, new text goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPoint {
    pub offset: usize,
    pub indent: String,
    /// The list is written on one line (`( A, B, )`)
    pub inline: bool,
    /// The last list entry lacks a separator; one goes here first
    pub comma_at: Option<usize>,
}

impl InsertionPoint {
    /// Insert a whole record line such as `ID /* name */ = {...};`.
    pub fn insert_line(&self, edits: &mut EditSet, line: &str) {
        edits.insert(self.offset, format!("{}{}\n", self.indent, line));
    }

    /// Insert one list entry such as `ID /* name */`.
    pub fn insert_entry(&self, edits: &mut EditSet, entry: &str) {
        if let Some(at) = self.comma_at {
            edits.insert(at, ",");
        }
        if self.inline {
            let lead = if self.comma_at.is_some() { " " } else { self.indent.as_str() };
            edits.insert(self.offset, format!("{lead}{entry},"));
        } else {
            edits.insert(self.offset, format!("{}{},\n", self.indent, entry));
        }
    }
}

/// Start of the line after a section's begin banner.
///
/// The indent is copied from the first record of the section, or two tabs
/// when the section is empty.
pub fn section_insertion_point(manifest: &Manifest, section: &str) -> Option<InsertionPoint> {
    let text = manifest.text();
    let Some(section) = manifest.section(section) else {
        debug!(section, "section banner not found");
        return None;
    };
    let offset = line_end(text, section.begin.end);
    let next = &text[offset..line_end(text, offset)];
    let indent = if next.trim().is_empty() || next.trim_start().starts_with("/* End") {
        "\t\t".to_string()
    } else {
        indent_at(text, offset).to_string()
    };
    Some(InsertionPoint {
        offset,
        indent,
        inline: false,
        comma_at: None,
    })
}

/// Insertion point for a new entry at the end of `record`'s `key` list.
pub fn list_insertion_point(manifest: &Manifest, record: &Record, key: &str) -> Option<InsertionPoint> {
    let text = manifest.text();
    let Some(list) = record.list(key) else {
        debug!(record = %record.id, key, "record has no such list");
        return None;
    };

    let last = list.items.last();
    let comma_at = last
        .filter(|item| !text[item.span.clone()].ends_with(','))
        .map(|item| item.value.span().end);

    let close_line = line_start(text, list.close);
    let closes_own_line = text[close_line..list.close].trim().is_empty();
    if !closes_own_line {
        let before = text[..list.close].chars().last();
        let needs_space = comma_at.is_none()
            && last.is_some()
            && before.is_some_and(|c| !c.is_whitespace());
        return Some(InsertionPoint {
            offset: list.close,
            indent: if needs_space { " ".to_string() } else { String::new() },
            inline: true,
            comma_at,
        });
    }

    let indent = match last {
        Some(item) if text[line_start(text, item.span.start)..item.span.start].trim().is_empty() => {
            indent_at(text, item.span.start).to_string()
        }
        _ => format!("{}\t", indent_at(text, list.close)),
    };
    Some(InsertionPoint {
        offset: close_line,
        indent,
        inline: false,
        comma_at,
    })
}

/// Resolve a marker to a record.
pub fn find_record<'m>(manifest: &'m Manifest, marker: Marker<'_>) -> Option<&'m Record> {
    match marker {
        Marker::Id(id) => manifest.record(id),
        Marker::Named { name, isa } => manifest.records().iter().find(|record| {
            isa.map_or(true, |kind| record.isa() == Some(kind)) && answers_to(record, name)
        }),
        Marker::Section(_) => None,
    }
}

/// Insertion point for a marker: sections directly, records via `key`.
pub fn insertion_point(manifest: &Manifest, marker: Marker<'_>, key: &str) -> Option<InsertionPoint> {
    match marker {
        Marker::Section(name) => section_insertion_point(manifest, name),
        other => find_record(manifest, other).and_then(|r| list_insertion_point(manifest, r, key)),
    }
}

fn answers_to(record: &Record, name: &str) -> bool {
    record.comment.as_deref() == Some(name)
        || record.scalar("name") == Some(name)
        || record.scalar("path") == Some(name)
}

/// Root of the group tree (`rootObject` -> `mainGroup`).
pub fn main_group(manifest: &Manifest) -> Option<&Record> {
    let id = manifest.project()?.scalar("mainGroup")?;
    manifest.record(id)
}

pub fn group_by_name<'m>(manifest: &'m Manifest, name: &str) -> Option<&'m Record> {
    manifest.groups().find(|g| answers_to(g, name))
}

/// The named group, or the main group when the name is absent or unknown.
pub fn group_or_main<'m>(manifest: &'m Manifest, name: Option<&str>) -> Option<&'m Record> {
    match name {
        Some(name) => group_by_name(manifest, name).or_else(|| {
            warn!(group = name, "group not found, falling back to the main group");
            main_group(manifest)
        }),
        None => main_group(manifest),
    }
}

pub fn target_by_name<'m>(manifest: &'m Manifest, name: &str) -> Option<&'m Record> {
    manifest
        .records_of(isa::NATIVE_TARGET)
        .find(|t| t.scalar("name") == Some(name) || t.comment.as_deref() == Some(name))
}

/// First target listed by the project.
pub fn first_target(manifest: &Manifest) -> Option<&Record> {
    let project = manifest.project()?;
    let id = project.list("targets")?.ids().next()?;
    manifest.record(id)
}

/// A target's build phase of the given kind, via its `buildPhases` list.
pub fn target_phase<'m>(manifest: &'m Manifest, target: &Record, kind: PhaseKind) -> Option<&'m Record> {
    let wanted = kind.isa()?;
    target
        .list("buildPhases")?
        .ids()
        .filter_map(|id| manifest.record(id))
        .find(|phase| phase.isa() == Some(wanted))
}

/// Phase of `kind` for the named target, or for the first target when no
/// name is given. Falls back to the first phase record of that kind.
pub fn phase_for<'m>(manifest: &'m Manifest, target: Option<&str>, kind: PhaseKind) -> Option<&'m Record> {
    let wanted = kind.isa()?;
    let target = match target {
        Some(name) => {
            let found = target_by_name(manifest, name);
            if found.is_none() {
                warn!(target = name, "target not found");
                return None;
            }
            found
        }
        None => first_target(manifest),
    };
    target
        .and_then(|t| target_phase(manifest, t, kind))
        .or_else(|| manifest.records_of(wanted).next())
}
