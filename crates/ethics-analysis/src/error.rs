//! Error types for run analysis

use std::path::PathBuf;

use crate::normalize::SkippedFile;

/// Run analysis errors
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    /// Discovery root does not exist
    #[error("result directory not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// File content is not valid JSON
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Parsed, but matches neither the single-run nor the batch shape
    #[error("unrecognised run shape in {}: {reason}", path.display())]
    Shape { path: PathBuf, reason: String },

    /// No usable runs remained after validation
    #[error("no usable runs found ({} file(s) skipped)", skipped.len())]
    EmptyInput { skipped: Vec<SkippedFile> },

    /// CSV output could not be created or written
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be read or parsed
    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for run analysis
pub type Result<T> = std::result::Result<T, AnalysisError>;
