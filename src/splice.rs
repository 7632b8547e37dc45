// src/splice.rs - Byte-range edits over manifest text

use crate::error::{PatchError, Result};
use std::ops::Range;

/// A single replacement of `range` in the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub range: Range<usize>,
    pub replacement: String,
}

/// An ordered collection of splices computed against one version of the text.
///
/// Offsets always refer to the text the set was computed from; applying the
/// set rewrites the text in a single pass. Insertions at the same offset keep
/// the order in which they were added.
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    splices: Vec<Splice>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.splices.push(Splice {
            range: offset..offset,
            replacement: text.into(),
        });
    }

    pub fn delete(&mut self, range: Range<usize>) {
        self.splices.push(Splice {
            range,
            replacement: String::new(),
        });
    }

    pub fn replace(&mut self, range: Range<usize>, text: impl Into<String>) {
        self.splices.push(Splice {
            range,
            replacement: text.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.splices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.splices.len()
    }

    pub fn extend(&mut self, other: EditSet) {
        self.splices.extend(other.splices);
    }

    /// Apply every splice to `text`.
    ///
    /// Overlapping deletions are merged. Any other overlap is a conflict.
    pub fn apply(&self, text: &str) -> Result<String> {
        let mut splices = self.splices.clone();
        // Stable: inserts at one offset keep their insertion order and come
        // before a deletion starting at the same offset.
        splices.sort_by_key(|s| (s.range.start, s.range.end));

        let mut merged: Vec<Splice> = Vec::with_capacity(splices.len());
        for splice in splices {
            if splice.range.end > text.len() || splice.range.start > splice.range.end {
                return Err(PatchError::Conflict {
                    start: splice.range.start,
                    end: splice.range.end,
                });
            }
            if let Some(last) = merged.last_mut() {
                let overlaps = splice.range.start < last.range.end;
                if overlaps {
                    if last.replacement.is_empty() && splice.replacement.is_empty() {
                        last.range.end = last.range.end.max(splice.range.end);
                        continue;
                    }
                    return Err(PatchError::Conflict {
                        start: splice.range.start,
                        end: splice.range.end,
                    });
                }
            }
            merged.push(splice);
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for splice in &merged {
            out.push_str(&text[cursor..splice.range.start]);
            out.push_str(&splice.replacement);
            cursor = splice.range.end;
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }
}

/// Offset of the first byte of the line holding `offset`.
pub fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Offset just past the newline ending the line holding `offset`.
pub fn line_end(text: &str, offset: usize) -> usize {
    text[offset..]
        .find('\n')
        .map(|i| offset + i + 1)
        .unwrap_or(text.len())
}

/// Leading whitespace of the line holding `offset`.
pub fn indent_at(text: &str, offset: usize) -> &str {
    let start = line_start(text, offset);
    let line = &text[start..];
    let width = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..width]
}

/// Grow `range` to whole lines when nothing but whitespace shares them.
///
/// If other content sits on the same line the range is returned unchanged,
/// so only the entry itself is removed.
pub fn expand_to_lines(text: &str, range: Range<usize>) -> Range<usize> {
    let start = line_start(text, range.start);
    let end = line_end(text, range.end);
    let before_blank = text[start..range.start].trim().is_empty();
    let after_blank = text[range.end..end].trim().is_empty();
    if before_blank && after_blank {
        start..end
    } else {
        range
    }
}

/// Collapse every run of two or more blank lines into one empty line.
///
/// A lone blank line is kept verbatim.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blanks: Vec<&str> = Vec::new();

    for line in text.split_inclusive('\n') {
        if line.ends_with('\n') && line.trim().is_empty() {
            blanks.push(line);
            continue;
        }
        flush_blanks(&mut out, &mut blanks);
        out.push_str(line);
    }
    flush_blanks(&mut out, &mut blanks);
    out
}

fn flush_blanks(out: &mut String, blanks: &mut Vec<&str>) {
    match blanks.len() {
        0 => {}
        1 => out.push_str(blanks[0]),
        _ => out.push('\n'),
    }
    blanks.clear();
}

/// One-based line and column of `offset`.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let line = text[..offset].matches('\n').count() + 1;
    let column = offset - line_start(text, offset) + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_insert_order() {
        let mut edits = EditSet::new();
        edits.insert(3, "1");
        edits.insert(3, "2");
        edits.replace(0..1, "X");
        assert_eq!(edits.apply("abcdef").unwrap(), "Xbc12def");
    }

    #[test]
    fn test_apply_merges_overlapping_deletes() {
        let mut edits = EditSet::new();
        edits.delete(1..4);
        edits.delete(2..5);
        edits.delete(2..5);
        assert_eq!(edits.apply("abcdefg").unwrap(), "afg");
    }

    #[test]
    fn test_apply_rejects_conflicting_replacements() {
        let mut edits = EditSet::new();
        edits.replace(1..4, "x");
        edits.replace(2..3, "y");
        assert!(matches!(
            edits.apply("abcdef"),
            Err(PatchError::Conflict { .. })
        ));
    }

    #[test]
    fn test_expand_to_lines() {
        let text = "a\n\t\tITEM,\nb ITEM, c\n";
        let item = text.find("ITEM").unwrap();
        assert_eq!(expand_to_lines(text, item..item + 5), 2..10);

        let inline = text.rfind("ITEM").unwrap();
        assert_eq!(
            expand_to_lines(text, inline..inline + 5),
            inline..inline + 5
        );
    }

    #[test]
    fn test_collapse_blank_lines() {
        let text = "a\n\n\n  \nb\n\nc\n";
        assert_eq!(collapse_blank_lines(text), "a\n\nb\n\nc\n");
        assert_eq!(collapse_blank_lines("a\nb"), "a\nb");
    }

    #[test]
    fn test_line_col() {
        let text = "ab\ncd\nef";
        assert_eq!(line_col(text, 0), (1, 1));
        assert_eq!(line_col(text, 4), (2, 2));
        assert_eq!(line_col(text, 8), (3, 3));
    }

    #[test]
    fn test_indent_at() {
        let text = "x\n\t\t\tfoo\n";
        assert_eq!(indent_at(text, 6), "\t\t\t");
    }
}
