// src/add/mod.rs - Registering files with the project
//
// A registration touches four places: the PBXFileReference section, the
// PBXBuildFile section, the owning group's `children` and the build phase's
// `files`. Each step is computed against the same parsed manifest, reports
// its own outcome, and is skipped when its record already exists.

pub mod batch;

use crate::error::{PatchError, Result};
use crate::ident::Identifier;
use crate::locator;
use crate::manifest::{isa, render_scalar, Manifest, PhaseKind, Record};
use crate::splice::EditSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

pub use batch::{add_batch, BatchReport, BatchSpec};

// ============================================================================
// FILE SPECIFICATION
// ============================================================================

/// A file to register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    /// Stored path, relative to the owning group
    pub path: String,

    /// Display name used in annotations; the file name when absent
    #[serde(default)]
    pub name: Option<String>,

    /// `lastKnownFileType`; inferred from the extension when absent
    #[serde(default)]
    pub file_type: Option<String>,

    /// Owning group; the main group when absent
    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub phase: PhaseKind,

    /// Target whose phase receives the build file; the first target when absent
    #[serde(default)]
    pub target: Option<String>,

    /// Fixed identifier for the file reference
    #[serde(default)]
    pub file_ref_id: Option<Identifier>,

    /// Fixed identifier for the build file
    #[serde(default)]
    pub build_file_id: Option<Identifier>,
}

impl FileSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            file_type: None,
            group: None,
            phase: PhaseKind::default(),
            target: None,
            file_ref_id: None,
            build_file_id: None,
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_phase(mut self, phase: PhaseKind) -> Self {
        self.phase = phase;
        self
    }

    pub fn for_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| {
            self.path
                .rsplit('/')
                .next()
                .filter(|n| !n.is_empty())
                .unwrap_or(&self.path)
        })
    }

    pub fn file_type(&self) -> &str {
        self.file_type
            .as_deref()
            .unwrap_or_else(|| file_type_for(&self.path))
    }
}

/// `lastKnownFileType` for a path, by extension.
pub fn file_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "swift" => "sourcecode.swift",
        "m" => "sourcecode.c.objc",
        "mm" => "sourcecode.cpp.objcpp",
        "h" => "sourcecode.c.h",
        "c" => "sourcecode.c.c",
        "cpp" | "cc" => "sourcecode.cpp.cpp",
        "metal" => "sourcecode.metal",
        "plist" | "xcprivacy" => "text.plist",
        "entitlements" => "text.plist.entitlements",
        "strings" => "text.plist.strings",
        "json" => "text.json",
        "storyboard" => "file.storyboard",
        "xib" => "file.xib",
        "xcassets" => "folder.assetcatalog",
        "png" => "image.png",
        "jpg" | "jpeg" => "image.jpeg",
        "framework" => "wrapper.framework",
        "md" => "net.daringfireball.markdown",
        _ => "text",
    }
}

// ============================================================================
// REPORTS
// ============================================================================

/// Result of one registration step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Added,
    AlreadyPresent,
    MarkerNotFound,
    /// Not attempted (phase `none`, or an earlier step failed)
    Skipped,
}

impl StepOutcome {
    pub fn is_added(self) -> bool {
        self == StepOutcome::Added
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAddition {
    pub path: String,
    pub file_ref_id: String,
    pub build_file_id: Option<String>,
    pub file_reference: StepOutcome,
    pub build_file: StepOutcome,
    pub group_child: StepOutcome,
    pub phase_entry: StepOutcome,
}

impl FileAddition {
    pub fn steps(&self) -> [(&'static str, StepOutcome); 4] {
        [
            ("file reference", self.file_reference),
            ("build file", self.build_file),
            ("group child", self.group_child),
            ("build phase entry", self.phase_entry),
        ]
    }

    pub fn changed(&self) -> bool {
        self.steps().iter().any(|(_, outcome)| outcome.is_added())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddReport {
    pub additions: Vec<FileAddition>,
}

impl AddReport {
    pub fn changed(&self) -> bool {
        self.additions.iter().any(FileAddition::changed)
    }
}

// ============================================================================
// REGISTRATION
// ============================================================================

/// Register every spec in order, re-parsing between files.
pub fn add_files(mut manifest: Manifest, specs: &[FileSpec]) -> Result<(Manifest, AddReport)> {
    let mut report = AddReport::default();
    for spec in specs {
        let (edits, addition) = plan_addition(&manifest, spec)?;
        if !edits.is_empty() {
            manifest = manifest.edit(&edits)?;
        }
        report.additions.push(addition);
    }
    Ok((manifest, report))
}

/// Compute the edits registering one file.
pub fn plan_addition(manifest: &Manifest, spec: &FileSpec) -> Result<(EditSet, FileAddition)> {
    if spec.path.trim().is_empty() {
        return Err(PatchError::Config("file path must not be empty".to_string()));
    }

    let name = spec.display_name();
    let mut edits = EditSet::new();
    let mut minted: Vec<String> = Vec::new();

    // 1. File reference
    let existing = match find_file_reference(manifest, &spec.path) {
        Some(record) => Some(record),
        None => fixed_record(manifest, spec.file_ref_id.as_ref(), isa::FILE_REFERENCE)?,
    };
    let (file_ref_id, file_reference) = match existing {
        Some(existing) => {
            debug!(path = %spec.path, id = %existing.id, "file reference already present");
            (existing.id.clone(), StepOutcome::AlreadyPresent)
        }
        None => {
            let id = claim(manifest, spec.file_ref_id.as_ref(), &minted)?;
            minted.push(id.clone());
            match locator::section_insertion_point(manifest, isa::FILE_REFERENCE) {
                Some(point) => {
                    point.insert_line(&mut edits, &file_reference_line(&id, spec));
                    (id, StepOutcome::Added)
                }
                None => (id, StepOutcome::MarkerNotFound),
            }
        }
    };
    let reference_ok = file_reference != StepOutcome::MarkerNotFound;

    // 2. Build file, only when the phase that will list it exists
    let phase = spec
        .phase
        .label()
        .filter(|_| reference_ok)
        .map(|label| (label, locator::phase_for(manifest, spec.target.as_deref(), spec.phase)));
    let existing_build = match find_build_file(manifest, &file_ref_id) {
        Some(record) => Some(record),
        None => fixed_record(manifest, spec.build_file_id.as_ref(), isa::BUILD_FILE)?,
    };
    if let Some(record) = existing_build {
        if record.scalar("fileRef") != Some(file_ref_id.as_str()) {
            return Err(PatchError::InvalidIdentifier(format!(
                "{} already joins a different file reference",
                record.id
            )));
        }
    }
    let (build_file_id, build_file) = match phase {
        None => (None, StepOutcome::Skipped),
        Some((_, None)) => (None, StepOutcome::MarkerNotFound),
        Some((label, Some(_))) => match existing_build {
            Some(existing) => (Some(existing.id.clone()), StepOutcome::AlreadyPresent),
            None => {
                let id = claim(manifest, spec.build_file_id.as_ref(), &minted)?;
                match locator::section_insertion_point(manifest, isa::BUILD_FILE) {
                    Some(point) => {
                        let line = format!(
                            "{id} /* {name} in {label} */ = {{isa = PBXBuildFile; fileRef = {file_ref_id} /* {name} */; }};"
                        );
                        point.insert_line(&mut edits, &line);
                        (Some(id), StepOutcome::Added)
                    }
                    None => (None, StepOutcome::MarkerNotFound),
                }
            }
        },
    };

    // 3. Group child
    let group_child = if !reference_ok {
        StepOutcome::Skipped
    } else {
        let group = match spec.group.as_deref() {
            Some(name) => locator::group_by_name(manifest, name),
            None => locator::main_group(manifest),
        };
        match group {
            Some(group) => add_list_entry(
                manifest,
                group,
                "children",
                &file_ref_id,
                &format!("{file_ref_id} /* {name} */"),
                &mut edits,
            ),
            None => StepOutcome::MarkerNotFound,
        }
    };

    // 4. Build phase entry
    let phase_entry = match (phase, &build_file_id) {
        (Some((label, Some(phase))), Some(build_id)) => add_list_entry(
            manifest,
            phase,
            "files",
            build_id,
            &format!("{build_id} /* {name} in {label} */"),
            &mut edits,
        ),
        (Some((_, None)), _) => StepOutcome::MarkerNotFound,
        _ => StepOutcome::Skipped,
    };

    let addition = FileAddition {
        path: spec.path.clone(),
        file_ref_id,
        build_file_id,
        file_reference,
        build_file,
        group_child,
        phase_entry,
    };
    for (step, outcome) in addition.steps() {
        match outcome {
            StepOutcome::Added => info!(path = %spec.path, step, "added"),
            StepOutcome::MarkerNotFound => warn!(path = %spec.path, step, "insertion point not found"),
            _ => debug!(path = %spec.path, step, ?outcome, "unchanged"),
        }
    }
    Ok((edits, addition))
}

fn add_list_entry(
    manifest: &Manifest,
    record: &Record,
    key: &str,
    id: &str,
    entry: &str,
    edits: &mut EditSet,
) -> StepOutcome {
    let Some(list) = record.list(key) else {
        return StepOutcome::MarkerNotFound;
    };
    if list.contains(id) {
        return StepOutcome::AlreadyPresent;
    }
    match locator::list_insertion_point(manifest, record, key) {
        Some(point) => {
            point.insert_entry(edits, entry);
            StepOutcome::Added
        }
        None => StepOutcome::MarkerNotFound,
    }
}

/// The file reference storing exactly `path`.
pub fn find_file_reference<'m>(manifest: &'m Manifest, path: &str) -> Option<&'m Record> {
    manifest
        .records_of(isa::FILE_REFERENCE)
        .find(|r| r.scalar("path") == Some(path))
}

/// The first build file joining `file_ref_id` to a phase.
pub fn find_build_file<'m>(manifest: &'m Manifest, file_ref_id: &str) -> Option<&'m Record> {
    manifest
        .records_of(isa::BUILD_FILE)
        .find(|r| r.scalar("fileRef") == Some(file_ref_id))
}

fn file_reference_line(id: &str, spec: &FileSpec) -> String {
    let name = spec.display_name();
    let mut fields = format!(
        "isa = PBXFileReference; lastKnownFileType = {};",
        render_scalar(spec.file_type(), false)
    );
    let file_name = spec.path.rsplit('/').next().unwrap_or(&spec.path);
    if name != file_name {
        fields.push_str(&format!(" name = {};", render_scalar(name, false)));
    }
    fields.push_str(&format!(
        " path = {}; sourceTree = \"<group>\";",
        render_scalar(&spec.path, false)
    ));
    format!("{id} /* {name} */ = {{{fields} }};")
}

/// The record a fixed identifier already names, when it is of `kind`.
///
/// An identifier taken by a record of another kind is an error.
fn fixed_record<'m>(manifest: &'m Manifest, fixed: Option<&Identifier>, kind: &str) -> Result<Option<&'m Record>> {
    let Some(id) = fixed else {
        return Ok(None);
    };
    match manifest.record(id.as_str()) {
        None => Ok(None),
        Some(record) if record.isa() == Some(kind) => {
            debug!(%id, kind, "fixed identifier already present");
            Ok(Some(record))
        }
        Some(record) => Err(PatchError::InvalidIdentifier(format!(
            "{id} is already used by a {} object",
            record.isa().unwrap_or("untyped")
        ))),
    }
}

/// A fixed identifier when given and unused, otherwise a fresh one.
fn claim(manifest: &Manifest, fixed: Option<&Identifier>, minted: &[String]) -> Result<String> {
    if let Some(id) = fixed {
        if manifest.record(id.as_str()).is_some() || minted.iter().any(|m| m == id.as_str()) {
            return Err(PatchError::InvalidIdentifier(format!(
                "{id} is already used by another object"
            )));
        }
        return Ok(id.to_string());
    }
    loop {
        let id = Identifier::generate_unique(manifest.text());
        if !minted.iter().any(|m| m == id.as_str()) {
            return Ok(id.to_string());
        }
    }
}
