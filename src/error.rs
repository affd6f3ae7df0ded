use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a merge run.
///
/// Per-item problems (a bad annotation, a missing image) never surface as
/// a `MergeError`; they are logged and counted in
/// [`ProcessingStats`](crate::types::ProcessingStats) instead.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("failed to read manifest {}: {source}", .path.display())]
    Manifest { path: PathBuf, source: io::Error },
    #[error("failed to parse annotation {}: {reason}", .path.display())]
    Xml { path: PathBuf, reason: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, MergeError>;
