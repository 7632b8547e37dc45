// src/report.rs - Human readable and JSON console reports

use crate::add::{AddReport, BatchReport, FileAddition, StepOutcome};
use crate::error::Result;
use crate::fix::{FixAllReport, MissingScan, OrphanReport, PathFix};
use crate::workflow::Outcome;
use serde::Serialize;
use std::io::{self, Write};

fn step_mark(outcome: StepOutcome) -> &'static str {
    match outcome {
        StepOutcome::Added => "✅",
        StepOutcome::AlreadyPresent => "✓",
        StepOutcome::MarkerNotFound => "⚠️",
        StepOutcome::Skipped => "·",
    }
}

fn step_text(outcome: StepOutcome) -> &'static str {
    match outcome {
        StepOutcome::Added => "added",
        StepOutcome::AlreadyPresent => "already present",
        StepOutcome::MarkerNotFound => "insertion point not found",
        StepOutcome::Skipped => "skipped",
    }
}

fn write_addition(out: &mut impl Write, addition: &FileAddition) -> io::Result<()> {
    writeln!(out, "📄 {} ({})", addition.path, addition.file_ref_id)?;
    for (step, outcome) in addition.steps() {
        writeln!(out, "   {} {step}: {}", step_mark(outcome), step_text(outcome))?;
    }
    Ok(())
}

pub fn write_add_report(out: &mut impl Write, report: &AddReport) -> io::Result<()> {
    writeln!(out, "🔧 Registering {} file(s)", report.additions.len())?;
    for addition in &report.additions {
        write_addition(out, addition)?;
    }
    Ok(())
}

pub fn write_batch_report(out: &mut impl Write, report: &BatchReport) -> io::Result<()> {
    writeln!(out, "📋 Found {} file(s)", report.found)?;
    for dir in &report.missing_dirs {
        writeln!(out, "⚠️  Directory not found: {dir}")?;
    }
    if !report.already_referenced.is_empty() {
        writeln!(out, "   {} already in the project", report.already_referenced.len())?;
    }
    for addition in &report.additions {
        write_addition(out, addition)?;
    }
    if report.deferred > 0 {
        writeln!(out, "⏭️  {} file(s) left for the next run", report.deferred)?;
    }
    Ok(())
}

pub fn write_path_fixes(out: &mut impl Write, fixes: &[PathFix]) -> io::Result<()> {
    if fixes.is_empty() {
        return writeln!(out, "✅ No duplicate path prefixes");
    }
    writeln!(out, "🔧 Fixed {} duplicate path prefix(es)", fixes.len())?;
    for fix in fixes {
        writeln!(out, "   {} → {}  (group: {})", fix.old, fix.new, fix.group)?;
    }
    Ok(())
}

pub fn write_missing(out: &mut impl Write, scan: &MissingScan) -> io::Result<()> {
    writeln!(
        out,
        "📋 Checked {} reference(s): {} present, {} bundle(s), {} skipped",
        scan.checked, scan.existing, scan.bundles, scan.skipped
    )?;
    if scan.missing.is_empty() {
        return writeln!(out, "✅ No missing files");
    }
    writeln!(out, "🗑️  {} missing file(s)", scan.missing.len())?;
    for missing in &scan.missing {
        writeln!(
            out,
            "   ❌ {} ({}, {} build file(s))",
            missing.path,
            missing.id,
            missing.build_files.len()
        )?;
    }
    Ok(())
}

pub fn write_orphans(out: &mut impl Write, report: &OrphanReport) -> io::Result<()> {
    for dir in &report.missing_dirs {
        writeln!(out, "⚠️  Directory not found: {dir}")?;
    }
    if report.orphans.is_empty() {
        return writeln!(out, "✅ All {} source file(s) are in the project", report.scanned);
    }
    writeln!(
        out,
        "🔍 {} of {} source file(s) are not in the project",
        report.orphans.len(),
        report.scanned
    )?;
    for orphan in &report.orphans {
        writeln!(out, "   {orphan}")?;
    }
    Ok(())
}

pub fn write_fix_all(out: &mut impl Write, report: &FixAllReport) -> io::Result<()> {
    let analysis = &report.analysis;
    writeln!(
        out,
        "📊 {} group(s) with paths, {} file reference(s), {} build file(s)",
        analysis.groups_with_paths, analysis.file_references, analysis.build_files
    )?;
    write_missing(out, &report.missing)?;
    write_path_fixes(out, &report.path_fixes)?;
    write_orphans(out, &report.orphans)?;
    writeln!(out)?;
    writeln!(out, "Total fixes: {}", report.total_fixes())?;
    for (kind, count) in &report.fixes_by_type {
        writeln!(out, "   {kind}: {count}")?;
    }
    Ok(())
}

pub fn write_outcome(out: &mut impl Write, outcome: &Outcome) -> io::Result<()> {
    match outcome {
        Outcome::Unchanged => writeln!(out, "✅ Nothing to change"),
        Outcome::Previewed { diff } => {
            write!(out, "{diff}")?;
            writeln!(out, "🔍 Dry run: manifest not modified")
        }
        Outcome::Declined { .. } => writeln!(out, "⏹️  Changes discarded"),
        Outcome::Written { backup, .. } => {
            writeln!(out, "✅ Backup: {}", backup.display())?;
            writeln!(out, "✅ Manifest updated")
        }
    }
}

/// Report and outcome as one pretty-printed JSON document.
pub fn write_json<T: Serialize>(out: &mut impl Write, report: &T, outcome: &Outcome) -> Result<()> {
    #[derive(Serialize)]
    struct Envelope<'a, T> {
        report: &'a T,
        outcome: &'a Outcome,
    }
    serde_json::to_writer_pretty(&mut *out, &Envelope { report, outcome })?;
    writeln!(out)?;
    Ok(())
}
