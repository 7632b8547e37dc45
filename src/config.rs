// src/config.rs - Project configuration loaded from YAML

use crate::add::{BatchSpec, FileSpec};
use crate::backup::BackupStyle;
use crate::error::{PatchError, Result};
use crate::fix::{FixOptions, Ownership};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

// ============================================================================
// MAIN CONFIGURATION
// ============================================================================

/// pbxpatch configuration
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// ```yaml
/// root: .
/// backup: random
/// ownership: tree
/// # orphan scan; defaults to the whole root (`[.]`)
/// source_dirs: [Views, Managers, Models, Extensions, Components, Widgets, Intents]
/// files:
///   - path: Managers/ApplePlacesManager.swift
///     group: Managers
/// batches:
///   - dirs: [Libraries/WishKit]
///     group: Libraries
///     limit: 20
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Project root; stored paths resolve against it
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Manifest path, relative to `root`; discovered when absent
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    /// Backup naming style
    #[serde(default)]
    pub backup: BackupStyle,

    /// How duplicated path prefixes are attributed to groups
    #[serde(default)]
    pub ownership: Ownership,

    /// Path components with these suffixes always count as existing
    #[serde(default = "default_bundle_suffixes")]
    pub bundle_suffixes: Vec<String>,

    /// `sourceTree` values that are not checked against the disk
    #[serde(default = "default_skip_source_trees")]
    pub skip_source_trees: Vec<String>,

    /// Directories scanned for unreferenced files, relative to `root`.
    /// The whole root by default; hidden, bundle and build directories are
    /// never entered.
    #[serde(default = "default_source_dirs")]
    pub source_dirs: Vec<String>,

    /// Extensions counted as source files by the orphan scan
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Files registered by `add-preset`
    #[serde(default)]
    pub files: Vec<FileSpec>,

    /// Directory batches registered by `add-batch` without arguments
    #[serde(default)]
    pub batches: Vec<BatchSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            manifest: None,
            backup: BackupStyle::default(),
            ownership: Ownership::default(),
            bundle_suffixes: default_bundle_suffixes(),
            skip_source_trees: default_skip_source_trees(),
            source_dirs: default_source_dirs(),
            source_extensions: default_source_extensions(),
            files: Vec::new(),
            batches: Vec::new(),
        }
    }
}

impl Config {
    /// Load and validate a configuration file.
    ///
    /// A relative `root` is taken relative to the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        if config.root.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.root = base.join(&config.root);
        }
        debug!(config = %path.display(), root = %config.root.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bundle_suffixes.iter().any(|s| s.trim().is_empty()) {
            return Err(PatchError::Config("bundle suffixes must not be empty".into()));
        }
        if self.source_extensions.iter().any(|s| s.trim().is_empty()) {
            return Err(PatchError::Config("source extensions must not be empty".into()));
        }

        let mut fixed_ids = Vec::new();
        for (i, file) in self.files.iter().enumerate() {
            if file.path.trim().is_empty() {
                return Err(PatchError::Config(format!("files[{i}]: path must not be empty")));
            }
            for id in file.file_ref_id.iter().chain(file.build_file_id.iter()) {
                if fixed_ids.contains(&id) {
                    return Err(PatchError::InvalidIdentifier(format!(
                        "{id} is assigned more than once"
                    )));
                }
                fixed_ids.push(id);
            }
        }

        for (i, batch) in self.batches.iter().enumerate() {
            if batch.dirs.is_empty() {
                return Err(PatchError::Config(format!("batches[{i}]: no directories given")));
            }
            if batch.extensions.is_empty() {
                return Err(PatchError::Config(format!("batches[{i}]: no extensions given")));
            }
            if batch.limit == Some(0) {
                return Err(PatchError::Config(format!("batches[{i}]: limit must be positive")));
            }
        }
        Ok(())
    }

    pub fn fix_options(&self) -> FixOptions {
        FixOptions {
            root: self.root.clone(),
            ownership: self.ownership,
            bundle_suffixes: self.bundle_suffixes.clone(),
            skip_source_trees: self.skip_source_trees.clone(),
            source_dirs: self.source_dirs.clone(),
            source_extensions: self.source_extensions.clone(),
        }
    }
}

// ============================================================================
// DEFAULT VALUE FUNCTIONS
// ============================================================================

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

pub(crate) fn default_bundle_suffixes() -> Vec<String> {
    [".xcassets", ".entitlements", ".storekit", ".app"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub(crate) fn default_skip_source_trees() -> Vec<String> {
    ["BUILT_PRODUCTS_DIR", "SDKROOT", "DEVELOPER_DIR"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub(crate) fn default_source_dirs() -> Vec<String> {
    vec![".".to_string()]
}

pub(crate) fn default_source_extensions() -> Vec<String> {
    ["swift", "m", "mm", "h", "c", "cpp"]
        .into_iter()
        .map(String::from)
        .collect()
}
