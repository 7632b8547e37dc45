// src/manifest/mod.rs - Parsed view of a project.pbxproj manifest
//
// The manifest is parsed once into records carrying byte spans into the
// original text. Nothing here mutates the text; editors build an
// `EditSet` against these spans and re-parse the result.

mod lexer;
mod parser;
pub mod tree;
pub mod value;

pub use lexer::render_scalar;
pub use tree::GroupTree;
pub use value::{Dict, Field, List, ListItem, Scalar, Value};

use crate::error::{PatchError, Result};
use crate::splice::EditSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use tracing::debug;

static SECTION_BANNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Begin|End) (\w+) section$").expect("valid banner pattern"));

// ============================================================================
// RECORD KINDS
// ============================================================================

/// `isa` values the editors care about
pub mod isa {
    pub const BUILD_FILE: &str = "PBXBuildFile";
    pub const FILE_REFERENCE: &str = "PBXFileReference";
    pub const GROUP: &str = "PBXGroup";
    pub const VARIANT_GROUP: &str = "PBXVariantGroup";
    pub const VERSION_GROUP: &str = "XCVersionGroup";
    pub const NATIVE_TARGET: &str = "PBXNativeTarget";
    pub const PROJECT: &str = "PBXProject";
    pub const SOURCES_PHASE: &str = "PBXSourcesBuildPhase";
    pub const RESOURCES_PHASE: &str = "PBXResourcesBuildPhase";
    pub const FRAMEWORKS_PHASE: &str = "PBXFrameworksBuildPhase";

    /// Kinds that own a `children` list
    pub const GROUP_KINDS: [&str; 3] = [GROUP, VARIANT_GROUP, VERSION_GROUP];
}

/// Build phase a new file is registered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    #[default]
    Sources,
    Resources,
    Frameworks,
    /// Reference only, no build file
    None,
}

impl PhaseKind {
    /// Record kind of the phase, `None` for reference-only additions.
    pub fn isa(self) -> Option<&'static str> {
        match self {
            PhaseKind::Sources => Some(isa::SOURCES_PHASE),
            PhaseKind::Resources => Some(isa::RESOURCES_PHASE),
            PhaseKind::Frameworks => Some(isa::FRAMEWORKS_PHASE),
            PhaseKind::None => None,
        }
    }

    /// Name used in build file comments (`Foo.swift in Sources`)
    pub fn label(self) -> Option<&'static str> {
        match self {
            PhaseKind::Sources => Some("Sources"),
            PhaseKind::Resources => Some("Resources"),
            PhaseKind::Frameworks => Some("Frameworks"),
            PhaseKind::None => None,
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseKind::Sources => "sources",
            PhaseKind::Resources => "resources",
            PhaseKind::Frameworks => "frameworks",
            PhaseKind::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for PhaseKind {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sources" => Ok(PhaseKind::Sources),
            "resources" => Ok(PhaseKind::Resources),
            "frameworks" => Ok(PhaseKind::Frameworks),
            "none" => Ok(PhaseKind::None),
            other => Err(PatchError::Config(format!(
                "unknown build phase '{other}' (expected sources, resources, frameworks or none)"
            ))),
        }
    }
}

// ============================================================================
// RECORDS AND SECTIONS
// ============================================================================

/// One `ID /* comment */ = { ... };` entry of the `objects` dictionary
#[derive(Debug, Clone)]
pub struct Record {
    pub id: String,
    /// Trailing annotation after the identifier
    pub comment: Option<String>,
    /// From the identifier through the terminating `;`
    pub span: Range<usize>,
    pub body: Dict,
}

impl Record {
    pub fn isa(&self) -> Option<&str> {
        self.scalar("isa")
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.body.get(key)
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(|f| f.value.as_str())
    }

    pub fn list(&self, key: &str) -> Option<&List> {
        self.field(key).and_then(|f| f.value.as_list())
    }

    pub fn is_group(&self) -> bool {
        self.isa().is_some_and(|kind| isa::GROUP_KINDS.contains(&kind))
    }

    /// Display name: the annotation, else `name`, else `path`.
    pub fn display_name(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .or_else(|| self.scalar("name"))
            .or_else(|| self.scalar("path"))
    }

    /// Declared `path` when it contributes a prefix (not empty, not `.`).
    pub fn group_path(&self) -> Option<&str> {
        self.scalar("path")
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty() && *p != ".")
    }
}

/// A `/* Begin X section */ ... /* End X section */` banner pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// Span of the begin banner comment
    pub begin: Range<usize>,
    /// Span of the matching end banner, if present
    pub end: Option<Range<usize>>,
}

// ============================================================================
// MANIFEST
// ============================================================================

/// A parsed manifest together with its source text
#[derive(Debug, Clone)]
pub struct Manifest {
    text: String,
    root: Dict,
    records: Vec<Record>,
    index: HashMap<String, usize>,
    sections: Vec<Section>,
}

impl Manifest {
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let tokens = lexer::tokenize(&text)?;
        let root = parser::Parser::new(&text, &tokens).parse_document()?;

        let objects = root
            .get("objects")
            .and_then(|f| f.value.as_dict())
            .ok_or_else(|| lexer::error_at(&text, root.open, "missing 'objects' dictionary"))?;

        let mut records = Vec::with_capacity(objects.fields.len());
        let mut index = HashMap::with_capacity(objects.fields.len());
        for field in &objects.fields {
            let body = field.value.as_dict().cloned().ok_or_else(|| {
                lexer::error_at(
                    &text,
                    field.value.span().start,
                    format!("object {} is not a dictionary", field.key.text),
                )
            })?;
            index.insert(field.key.text.clone(), records.len());
            records.push(Record {
                id: field.key.text.clone(),
                comment: field.key_comment.clone(),
                span: field.span.clone(),
                body,
            });
        }

        let mut sections: Vec<Section> = Vec::new();
        let within_objects = objects.open..objects.close;
        for token in tokens
            .iter()
            .filter(|t| t.kind == lexer::TokenKind::Comment && within_objects.contains(&t.span.start))
        {
            let comment = lexer::comment_text(&text[token.span.clone()]);
            let Some(caps) = SECTION_BANNER.captures(comment) else {
                continue;
            };
            let name = &caps[2];
            if &caps[1] == "Begin" {
                sections.push(Section {
                    name: name.to_string(),
                    begin: token.span.clone(),
                    end: None,
                });
            } else if let Some(open) = sections
                .iter_mut()
                .rev()
                .find(|s| s.name == name && s.end.is_none())
            {
                open.end = Some(token.span.clone());
            }
        }

        debug!(
            records = records.len(),
            sections = sections.len(),
            "parsed manifest"
        );

        Ok(Self {
            text,
            root,
            records,
            index,
            sections,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Records of one kind, in manifest order.
    pub fn records_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.isa() == Some(kind))
    }

    pub fn groups(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_group())
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Scalar field of the root dictionary (`rootObject`, `objectVersion`, ...)
    pub fn root_scalar(&self, key: &str) -> Option<&str> {
        self.root.get(key).and_then(|f| f.value.as_str())
    }

    /// The `PBXProject` record named by `rootObject`.
    pub fn project(&self) -> Option<&Record> {
        self.root_scalar("rootObject").and_then(|id| self.record(id))
    }

    /// Whether `needle` occurs anywhere in the text, comments included.
    pub fn mentions(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    /// Apply `edits` and parse the result.
    pub fn edit(&self, edits: &EditSet) -> Result<Manifest> {
        Manifest::parse(edits.apply(&self.text)?)
    }
}

impl FromStr for Manifest {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self> {
        Manifest::parse(s)
    }
}

#[cfg(test)]
pub(crate) const SAMPLE: &str = include_str!("../../tests/fixtures/sample.pbxproj");
