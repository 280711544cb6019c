use std::path::PathBuf;
use thiserror::Error;

/// The main error type for labelrecon operations.
#[derive(Debug, Error)]
pub enum LabelReconError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed while traversing {}: {source}", path.display())]
    DirectoryWalk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Malformed label file {}: {message}", path.display())]
    MalformedLabelFile { path: PathBuf, message: String },

    #[error("No common subfolder found across {} folder(s)", roots.len())]
    NoCommonGroup { roots: Vec<PathBuf> },

    #[error("None of the {} provided folder(s) could be scanned", roots.len())]
    NoUsableFolders { roots: Vec<PathBuf> },

    #[error("Failed to write report to {}: {message}", path.display())]
    WriteFailure { path: PathBuf, message: String },

    #[error("Failed to read image {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write image {}: {source}", path.display())]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read config from {}: {message}", path.display())]
    ConfigRead { path: PathBuf, message: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Failed to render JSON report: {0}")]
    ReportJson(#[source] serde_json::Error),

    #[error("Found {conflict_count} conflicting row(s)")]
    ConflictsFound { conflict_count: usize },
}
