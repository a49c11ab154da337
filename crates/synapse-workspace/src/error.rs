//! Error types for the workspace layer
//!
//! Provides error handling for:
//! - Output-root preparation (reset before each run)
//! - Archive creation

use std::path::PathBuf;
use synapse_manifest::PathError;

/// Errors preparing the output root
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// Output root is a filesystem root or otherwise unsafe to wipe
    #[error("refusing to use {0} as output root")]
    UnsafeRoot(PathBuf),

    /// Archive destination lies inside the output root
    #[error("archive path {archive} must not be inside output root {root}")]
    ArchiveInsideRoot { archive: PathBuf, root: PathBuf },

    /// IO error while resetting
    #[error("io error resetting {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root could not be bound for sanitization
    #[error("output root error: {0}")]
    Root(#[from] PathError),
}

impl WorkspaceError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors creating an archive
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// IO error on the archive file
    #[error("io error writing archive {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Zip encoder failure
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Blocking archive task did not complete
    #[error("archive task failed: {0}")]
    Task(String),
}

impl ArchiveError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
