//! PBXPATCH - Xcode project manifest editor
//!
//! Edits `project.pbxproj` files in place: registers source files and whole
//! library directories, strips path prefixes that repeat a parent group's
//! path, removes references to files that no longer exist and reports
//! files the project never references.
//!
//! The manifest is parsed into records carrying byte spans. Every change is
//! a splice over the original text, so bytes that no operation touches come
//! out exactly as they went in.
//!
//! # Examples
//!
//! ```rust
//! use pbxpatch::fix::{fix_duplicate_paths, Ownership};
//! use pbxpatch::Manifest;
//!
//! let text = "// !$*UTF8*$!\n{\n\tobjects = {\n\
//!     \t\tG1 /* Lib */ = {isa = PBXGroup; children = (F1,); path = Lib; sourceTree = \"<group>\"; };\n\
//!     \t\tF1 /* A.swift */ = {isa = PBXFileReference; path = Lib/A.swift; sourceTree = \"<group>\"; };\n\
//!     \t};\n}\n";
//!
//! let manifest = Manifest::parse(text)?;
//! let (fixed, fixes) = fix_duplicate_paths(&manifest, Ownership::Tree)?;
//! assert_eq!(fixes[0].new, "A.swift");
//! assert!(fixed.text().contains("path = A.swift;"));
//! # Ok::<(), pbxpatch::PatchError>(())
//! ```

// ============================================================================
// CORE MODULES
// ============================================================================

/// Error type shared by every operation
pub mod error;

/// Byte-range edits over manifest text
pub mod splice;

/// Manifest parsing: records, sections and the group tree
pub mod manifest;

/// Object identifiers
pub mod ident;

/// Section, record and list insertion points
pub mod locator;

// ============================================================================
// OPERATIONS
// ============================================================================

/// Registering single files and directory batches
pub mod add;

/// Duplicate prefixes, missing files and orphans
pub mod fix;

/// Source file discovery
pub mod scan;

// ============================================================================
// I/O AND CONFIGURATION
// ============================================================================

/// YAML configuration
pub mod config;

/// Backups taken before writing
pub mod backup;

/// Preview, confirmation and write-back
pub mod workflow;

/// Console and JSON reports
pub mod report;

// ============================================================================
// PUBLIC RE-EXPORTS
// ============================================================================

pub use add::{add_batch, add_files, AddReport, BatchSpec, FileSpec, StepOutcome};
pub use backup::BackupStyle;
pub use config::Config;
pub use error::{PatchError, Result};
pub use fix::{FixOptions, Ownership};
pub use ident::Identifier;
pub use manifest::{Manifest, PhaseKind};
pub use workflow::{commit, AutoApprove, CommitOptions, Confirm, Outcome, TerminalPrompt, Workspace};

// ============================================================================
// VERSION INFORMATION
// ============================================================================

/// pbxpatch version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Install a stderr `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` picks the level for this
/// crate (0 = warn, 1 = info, 2+ = debug). Calling it twice is harmless.
pub fn init_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pbxpatch={level}")));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
