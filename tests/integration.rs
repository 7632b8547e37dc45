use pbxpatch::fix::{self, FixOptions};
use pbxpatch::workflow::{self, CommitOptions, Outcome, Workspace};
use pbxpatch::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SAMPLE: &str = include_str!("fixtures/sample.pbxproj");

/// Sample project on disk. `Managers/Legacy.swift` is left out on purpose.
fn project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("Sample.xcodeproj")).unwrap();
    fs::create_dir_all(root.join("Libraries/CurrencyPicker")).unwrap();
    fs::create_dir_all(root.join("Managers")).unwrap();
    fs::write(root.join("AppDelegate.swift"), "").unwrap();
    fs::write(root.join("Libraries/CurrencyPicker/CurrencyAdapter.swift"), "").unwrap();
    let manifest = root.join("Sample.xcodeproj/project.pbxproj");
    fs::write(&manifest, SAMPLE).unwrap();
    (dir, manifest)
}

fn options(root: &Path) -> FixOptions {
    FixOptions {
        root: root.to_path_buf(),
        ..FixOptions::default()
    }
}

fn backups(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(root.join("Sample.xcodeproj"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.to_string_lossy().contains(".backup."))
        .collect();
    found.sort();
    found
}

#[test]
fn test_add_manager_to_group_and_sources() {
    let (dir, path) = project();
    let workspace = Workspace::discover(dir.path()).unwrap();
    assert_eq!(workspace.manifest, path);

    let original = workspace.read().unwrap();
    let manifest = Manifest::parse(original.as_str()).unwrap();
    let spec = FileSpec::new("Managers/ApplePlacesManager.swift").in_group("Managers");
    let (updated, report) = add_files(manifest, &[spec]).unwrap();

    let addition = &report.additions[0];
    assert!(addition.steps().iter().all(|(_, o)| *o == StepOutcome::Added));
    let file_ref = addition.file_ref_id.clone();
    let build = addition.build_file_id.clone().unwrap();

    let text = updated.text();
    assert!(text.contains(&format!(
        "\t\t{file_ref} /* ApplePlacesManager.swift */ = {{isa = PBXFileReference; lastKnownFileType = sourcecode.swift; path = Managers/ApplePlacesManager.swift; sourceTree = \"<group>\"; }};\n"
    )));
    assert!(text.contains(&format!(
        "{build} /* ApplePlacesManager.swift in Sources */ = {{isa = PBXBuildFile; fileRef = {file_ref} /* ApplePlacesManager.swift */; }};"
    )));

    let managers = updated.record("C10000000000000000000002").unwrap();
    assert!(managers.list("children").unwrap().contains(&file_ref));
    let sources = updated.record("D10000000000000000000001").unwrap();
    assert!(sources.list("files").unwrap().contains(&build));

    let outcome = workflow::commit(
        &path,
        &original,
        updated.text(),
        CommitOptions::default(),
        &mut AutoApprove,
    )
    .unwrap();
    assert!(matches!(outcome, Outcome::Written { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), updated.text());
}

#[test]
fn test_second_add_is_a_no_op() {
    let manifest = Manifest::parse(SAMPLE).unwrap();
    let spec = FileSpec::new("Managers/ApplePlacesManager.swift").in_group("Managers");
    let (once, _) = add_files(manifest, &[spec.clone()]).unwrap();
    let (twice, report) = add_files(once.clone(), &[spec]).unwrap();

    assert!(!report.changed());
    assert_eq!(twice.text(), once.text());
}

#[test]
fn test_currency_picker_prefix_fixed_with_backup() {
    let (dir, path) = project();
    let original = fs::read_to_string(&path).unwrap();
    let manifest = Manifest::parse(original.as_str()).unwrap();

    let (fixed, fixes) = fix::fix_duplicate_paths(&manifest, Ownership::Tree).unwrap();
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].old, "Libraries/CurrencyPicker/CurrencyAdapter.swift");
    assert_eq!(fixes[0].new, "CurrencyPicker/CurrencyAdapter.swift");
    assert!(fixed
        .text()
        .contains("path = \"CurrencyPicker/CurrencyAdapter.swift\";"));

    let outcome = workflow::commit(
        &path,
        &original,
        fixed.text(),
        CommitOptions::default(),
        &mut AutoApprove,
    )
    .unwrap();
    let Outcome::Written { backup, diff } = outcome else {
        panic!("expected a write");
    };
    assert_eq!(fs::read(&backup).unwrap(), SAMPLE.as_bytes());
    assert!(diff.contains("CurrencyPicker/CurrencyAdapter.swift"));
    assert_eq!(backups(dir.path()), vec![backup]);

    // A second pass finds nothing left to fix
    let (again, fixes) = fix::fix_duplicate_paths(&fixed, Ownership::Tree).unwrap();
    assert!(fixes.is_empty());
    assert_eq!(again.text(), fixed.text());
}

#[test]
fn test_missing_file_removed_everywhere() {
    let (dir, _) = project();
    let manifest = Manifest::parse(SAMPLE).unwrap();
    let (cleaned, scan) = fix::remove_missing(&manifest, &options(dir.path())).unwrap();

    assert_eq!(scan.missing.len(), 1);
    assert_eq!(scan.missing[0].path, "Managers/Legacy.swift");
    assert_eq!(scan.bundles, 1);
    assert_eq!(scan.skipped, 1);

    let text = cleaned.text();
    assert!(!text.contains("B10000000000000000000003"));
    assert!(!text.contains("A10000000000000000000003"));
    assert!(!text.contains("\n\n\n"));
    assert!(text.contains("A10000000000000000000002 /* CurrencyAdapter.swift in Sources */,"));
    assert_eq!(cleaned.records().len(), manifest.records().len() - 2);
}

#[test]
fn test_fix_all_counts_each_kind() {
    let (dir, _) = project();
    fs::write(dir.path().join("Managers/Extra.swift"), "").unwrap();
    let manifest = Manifest::parse(SAMPLE).unwrap();

    let (fixed, report) = fix::fix_all(&manifest, &options(dir.path())).unwrap();
    assert_eq!(report.analysis.file_references, 5);
    assert_eq!(report.total_fixes(), 2);
    assert_eq!(report.fixes_by_type.get(fix::all::REMOVED_MISSING), Some(&1));
    assert_eq!(report.fixes_by_type.get(fix::all::DUPLICATE_PATH), Some(&1));
    assert_eq!(report.orphans.orphans, vec!["Managers/Extra.swift"]);
    assert_ne!(fixed.text(), SAMPLE);
}

#[test]
fn test_dry_run_leaves_disk_alone() {
    let (dir, path) = project();
    let manifest = Manifest::parse(SAMPLE).unwrap();
    let (fixed, _) = fix::fix_duplicate_paths(&manifest, Ownership::Prefix).unwrap();

    let dry = CommitOptions {
        dry_run: true,
        backup: BackupStyle::Random,
    };
    let outcome = workflow::commit(&path, SAMPLE, fixed.text(), dry, &mut AutoApprove).unwrap();
    assert!(outcome.diff().is_some_and(|d| d.contains("+")));
    assert!(matches!(outcome, Outcome::Previewed { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
    assert!(backups(dir.path()).is_empty());
}

#[test]
fn test_batch_registers_new_library_files() {
    let (dir, _) = project();
    let lib = dir.path().join("Libraries/WishKit");
    fs::create_dir_all(&lib).unwrap();
    fs::write(lib.join("WishKit.swift"), "").unwrap();
    fs::write(lib.join("WishView.swift"), "").unwrap();
    fs::write(lib.join("README.md"), "").unwrap();

    let mut spec = BatchSpec::new(vec!["Libraries".into()]);
    spec.group = Some("Libraries".into());
    let manifest = Manifest::parse(SAMPLE).unwrap();
    let (updated, report) = add_batch(manifest, dir.path(), &spec).unwrap();

    assert_eq!(report.found, 3);
    assert_eq!(report.already_referenced, vec!["Libraries/CurrencyPicker/CurrencyAdapter.swift"]);
    let paths: Vec<&str> = report.additions.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(paths, vec!["WishKit/WishKit.swift", "WishKit/WishView.swift"]);
    assert!(updated.text().contains("path = WishKit/WishView.swift;"));

    // Everything is known now
    let (again, report) = add_batch(updated.clone(), dir.path(), &spec).unwrap();
    assert!(!report.changed());
    assert_eq!(again.text(), updated.text());
}

#[test]
fn test_config_drives_preset() {
    let (dir, _) = project();
    let yaml = "files:\n  - path: Managers/ApplePlacesManager.swift\n    group: Managers\n    file_ref_id: 0123456789ABCDEF01234567\n";
    let config_path = dir.path().join("pbxpatch.yaml");
    fs::write(&config_path, yaml).unwrap();

    let config = Config::from_file(&config_path).unwrap();
    let workspace = Workspace::open(&config.root, config.manifest.as_deref()).unwrap();
    let manifest = Manifest::parse(workspace.read().unwrap()).unwrap();
    let (updated, report) = add_files(manifest, &config.files).unwrap();

    assert_eq!(report.additions[0].file_ref_id, "0123456789ABCDEF01234567");
    assert!(updated
        .text()
        .contains("0123456789ABCDEF01234567 /* ApplePlacesManager.swift */,"));
}
