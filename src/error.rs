use thiserror::Error;

/// Error type shared by every manifest operation.
#[derive(Error, Debug)]
pub enum PatchError {
    /// I/O related failure
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while parsing YAML configuration files
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error while rendering a JSON report
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The manifest text does not follow the property list grammar
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A value that should be a 24 character uppercase hex identifier is not
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// No manifest could be located for the project
    #[error("Project manifest not found: {0}")]
    ManifestNotFound(String),

    /// Two edits touch the same bytes with different replacements
    #[error("Conflicting edits at bytes {start}..{end}")]
    Conflict { start: usize, end: usize },

    /// Directory traversal failed
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Convenient alias over [`Result`] using [`PatchError`]
pub type Result<T> = std::result::Result<T, PatchError>;
