// src/workflow.rs - Reading, previewing, backing up and writing a manifest
//
// Every operation ends here: the edited text is diffed against what was
// read, shown when previewing, confirmed, backed up and written. A run that
// changes nothing writes nothing.

use crate::backup::{create_backup, BackupStyle};
use crate::error::{PatchError, Result};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the manifest inside a project bundle
pub const MANIFEST_FILE: &str = "project.pbxproj";

// ============================================================================
// WORKSPACE
// ============================================================================

/// Project root together with the manifest it edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub root: PathBuf,
    pub manifest: PathBuf,
}

impl Workspace {
    /// Use `manifest` when given (relative paths resolve against `root`),
    /// otherwise discover the single project bundle under `root`.
    pub fn open(root: impl Into<PathBuf>, manifest: Option<&Path>) -> Result<Self> {
        let root = root.into();
        match manifest {
            Some(path) => {
                let manifest = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    root.join(path)
                };
                if !manifest.is_file() {
                    return Err(PatchError::ManifestNotFound(manifest.display().to_string()));
                }
                Ok(Self { root, manifest })
            }
            None => Self::discover(root),
        }
    }

    /// Find `<Name>.xcodeproj/project.pbxproj` directly under `root`.
    pub fn discover(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut found = Vec::new();
        for entry in fs::read_dir(&root)? {
            let path = entry?.path();
            let is_bundle = path
                .extension()
                .is_some_and(|ext| ext == "xcodeproj");
            let manifest = path.join(MANIFEST_FILE);
            if is_bundle && manifest.is_file() {
                found.push(manifest);
            }
        }
        found.sort();

        match found.len() {
            1 => {
                let manifest = found.remove(0);
                debug!(manifest = %manifest.display(), "discovered manifest");
                Ok(Self { root, manifest })
            }
            0 => Err(PatchError::ManifestNotFound(format!(
                "no *.xcodeproj/{MANIFEST_FILE} under {}",
                root.display()
            ))),
            n => Err(PatchError::ManifestNotFound(format!(
                "{n} project bundles under {}; pass --manifest to choose one",
                root.display()
            ))),
        }
    }

    pub fn read(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.manifest)?)
    }
}

// ============================================================================
// CONFIRMATION
// ============================================================================

/// Asks whether a computed change may be written
pub trait Confirm {
    fn confirm(&mut self, diff: &str) -> Result<bool>;
}

/// Approves everything (`--yes`, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl Confirm for AutoApprove {
    fn confirm(&mut self, _diff: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Shows the diff on stderr and reads `y`/`n` from stdin.
///
/// Approves without asking when stdin is not a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&mut self, diff: &str) -> Result<bool> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Ok(true);
        }
        let mut stderr = io::stderr().lock();
        write!(stderr, "{diff}")?;
        write!(stderr, "Apply these changes? [y/N] ")?;
        stderr.flush()?;

        let mut answer = String::new();
        stdin.lock().read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

// ============================================================================
// COMMIT
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOptions {
    pub dry_run: bool,
    pub backup: BackupStyle,
}

/// What happened to the manifest file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Unchanged,
    Previewed { diff: String },
    Declined { diff: String },
    Written { backup: PathBuf, diff: String },
}

impl Outcome {
    pub fn diff(&self) -> Option<&str> {
        match self {
            Outcome::Unchanged => None,
            Outcome::Previewed { diff } | Outcome::Declined { diff } | Outcome::Written { diff, .. } => {
                Some(diff)
            }
        }
    }
}

/// Unified diff between two manifest versions.
pub fn unified_diff(original: &str, updated: &str) -> String {
    diffy::create_patch(original, updated).to_string()
}

/// Write `updated` over `path` unless it equals `original`, previewing or
/// asking first as `options` and `confirm` dictate.
pub fn commit(
    path: &Path,
    original: &str,
    updated: &str,
    options: CommitOptions,
    confirm: &mut dyn Confirm,
) -> Result<Outcome> {
    if original == updated {
        debug!("no changes to write");
        return Ok(Outcome::Unchanged);
    }

    let diff = unified_diff(original, updated);
    if options.dry_run {
        info!("dry run, manifest left untouched");
        return Ok(Outcome::Previewed { diff });
    }
    if !confirm.confirm(&diff)? {
        info!("change declined");
        return Ok(Outcome::Declined { diff });
    }

    let backup = create_backup(path, original.as_bytes(), options.backup)?;
    fs::write(path, updated)?;
    info!(manifest = %path.display(), "manifest written");
    Ok(Outcome::Written { backup, diff })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Refuse;

    impl Confirm for Refuse {
        fn confirm(&mut self, _diff: &str) -> Result<bool> {
            Ok(false)
        }
    }

    fn project() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let bundle = dir.path().join("App.xcodeproj");
        fs::create_dir_all(&bundle).unwrap();
        let manifest = bundle.join(MANIFEST_FILE);
        fs::write(&manifest, "a\nb\n").unwrap();
        (dir, manifest)
    }

    fn backups(dir: &Path) -> usize {
        fs::read_dir(dir.join("App.xcodeproj"))
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .contains(".backup.")
            })
            .count()
    }

    #[test]
    fn test_discover_single_bundle() {
        let (dir, manifest) = project();
        let workspace = Workspace::discover(dir.path()).unwrap();
        assert_eq!(workspace.manifest, manifest);

        fs::create_dir_all(dir.path().join("Other.xcodeproj")).unwrap();
        fs::write(dir.path().join("Other.xcodeproj").join(MANIFEST_FILE), "").unwrap();
        assert!(matches!(
            Workspace::discover(dir.path()),
            Err(PatchError::ManifestNotFound(_))
        ));
    }

    #[test]
    fn test_commit_writes_backup_then_manifest() {
        let (dir, manifest) = project();
        let outcome = commit(&manifest, "a\nb\n", "a\nc\n", CommitOptions::default(), &mut AutoApprove).unwrap();

        let Outcome::Written { backup, diff } = outcome else {
            panic!("expected a write");
        };
        assert_eq!(fs::read_to_string(&backup).unwrap(), "a\nb\n");
        assert_eq!(fs::read_to_string(&manifest).unwrap(), "a\nc\n");
        assert!(diff.contains("-b\n+c\n"));
        assert_eq!(backups(dir.path()), 1);
    }

    #[test]
    fn test_dry_run_and_decline_touch_nothing() {
        let (dir, manifest) = project();
        let dry = CommitOptions {
            dry_run: true,
            ..CommitOptions::default()
        };
        assert!(matches!(
            commit(&manifest, "a\nb\n", "a\nc\n", dry, &mut AutoApprove).unwrap(),
            Outcome::Previewed { .. }
        ));
        assert!(matches!(
            commit(&manifest, "a\nb\n", "a\nc\n", CommitOptions::default(), &mut Refuse).unwrap(),
            Outcome::Declined { .. }
        ));
        assert_eq!(
            commit(&manifest, "a\nb\n", "a\nb\n", CommitOptions::default(), &mut AutoApprove).unwrap(),
            Outcome::Unchanged
        );
        assert_eq!(fs::read_to_string(&manifest).unwrap(), "a\nb\n");
        assert_eq!(backups(dir.path()), 0);
    }
}
