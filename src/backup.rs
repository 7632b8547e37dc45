// src/backup.rs - Sibling backups taken before a manifest is overwritten

use crate::error::{PatchError, Result};
use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Suffix style for backup names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupStyle {
    /// `<manifest>.backup.YYYYmmdd_HHMMSS`
    #[default]
    Timestamp,
    /// `<manifest>.backup.<8 hex digits>`
    Random,
}

impl fmt::Display for BackupStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupStyle::Timestamp => f.write_str("timestamp"),
            BackupStyle::Random => f.write_str("random"),
        }
    }
}

impl FromStr for BackupStyle {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "timestamp" => Ok(BackupStyle::Timestamp),
            "random" => Ok(BackupStyle::Random),
            other => Err(PatchError::Config(format!(
                "unknown backup style '{other}' (expected timestamp or random)"
            ))),
        }
    }
}

impl BackupStyle {
    fn token(self) -> String {
        match self {
            BackupStyle::Timestamp => Local::now().format("%Y%m%d_%H%M%S").to_string(),
            BackupStyle::Random => format!("{:08x}", rand::thread_rng().gen::<u32>()),
        }
    }
}

/// Backup path for `manifest` without any collision suffix.
pub fn backup_path(manifest: &Path, style: BackupStyle) -> PathBuf {
    let mut name = manifest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".backup.{}", style.token()));
    manifest.with_file_name(name)
}

/// Write `original` to a fresh backup next to `manifest`.
///
/// Never overwrites: a taken name gets `.1`, `.2`, ... appended.
pub fn create_backup(manifest: &Path, original: &[u8], style: BackupStyle) -> Result<PathBuf> {
    let base = backup_path(manifest, style);
    let mut candidate = base.clone();
    let mut attempt = 0u32;
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                file.write_all(original)?;
                file.sync_all()?;
                info!(backup = %candidate.display(), "backup created");
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                attempt += 1;
                let mut name = base.as_os_str().to_os_string();
                name.push(format!(".{attempt}"));
                candidate = PathBuf::from(name);
            }
            Err(e) => return Err(e.into()),
        }
    }
}
