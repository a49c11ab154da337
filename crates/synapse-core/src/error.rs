//! Error types for Synapse Core
//!
//! Provides error handling for:
//! - Pipeline runs (backend, manifest, write and archive failures)
//! - Generative backend calls
//! - Requirement planning
//! - Publishing to a remote repository
//! - Configuration loading

use std::path::PathBuf;
use synapse_manifest::ManifestError;
use synapse_workspace::{ArchiveError, WorkspaceError};

/// Failure classes surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Backend unreachable, timed out or returned an error
    BackendUnavailable,
    /// Response carried no usable manifest
    MalformedManifest,
    /// Every entry was dropped
    NoFilesGenerated,
    /// Some entries could not be written (warnings only)
    PartialWriteFailure,
    /// Archive could not be created
    ArchiveError,
    /// Output root could not be prepared
    Workspace,
    /// Caller supplied unusable input
    InvalidInput,
}

impl ErrorKind {
    /// Whether this class ends a run
    #[inline]
    #[must_use]
    pub fn is_fatal(self) -> bool {
        !matches!(self, Self::PartialWriteFailure)
    }

    /// Stable identifier
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BackendUnavailable => "backend_unavailable",
            Self::MalformedManifest => "malformed_manifest",
            Self::NoFilesGenerated => "no_files_generated",
            Self::PartialWriteFailure => "partial_write_failure",
            Self::ArchiveError => "archive_error",
            Self::Workspace => "workspace",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal pipeline error
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Backend call failed; message is already redacted
    #[error("generative backend unavailable: {0}")]
    BackendUnavailable(String),

    /// No manifest could be parsed
    #[error("malformed manifest: {0}")]
    MalformedManifest(#[from] ManifestError),

    /// Nothing survived validation, sanitization and writing
    #[error("no files generated ({dropped} entries dropped)")]
    NoFilesGenerated {
        /// Number of entries that were dropped with a warning
        dropped: usize,
    },

    /// Archive creation failed
    #[error("archive failed: {0}")]
    Archive(#[from] ArchiveError),

    /// Output root preparation failed
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// Caller supplied unusable input
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    /// Failure class
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::MalformedManifest(_) => ErrorKind::MalformedManifest,
            Self::NoFilesGenerated { .. } => ErrorKind::NoFilesGenerated,
            Self::Archive(_) => ErrorKind::ArchiveError,
            Self::Workspace(_) => ErrorKind::Workspace,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// Every pipeline error ends the run
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

/// Generative backend errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// Backend cannot be constructed from configuration
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    /// Connection failure
    #[error("backend unreachable: {0}")]
    Unavailable(String),

    /// Request exceeded the configured timeout
    #[error("backend timed out after {secs}s")]
    Timeout {
        /// Configured timeout
        secs: u64,
    },

    /// Non-success HTTP status
    #[error("backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Truncated, redacted response body
        body: String,
    },

    /// Response did not carry generated text
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

/// Requirement planning errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlannerError {
    /// Requirement was empty or whitespace
    #[error("requirement must not be empty")]
    EmptyRequirement,
}

/// Publishing errors
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Publisher cannot be constructed from configuration
    #[error("publisher not configured: {0}")]
    NotConfigured(String),

    /// Token rejected
    #[error("publisher rejected credentials (HTTP {status})")]
    Unauthorized {
        /// HTTP status code
        status: u16,
    },

    /// Non-success HTTP status
    #[error("{operation} failed with HTTP {status}: {message}")]
    Status {
        /// What was being attempted
        operation: String,
        /// HTTP status code
        status: u16,
        /// Truncated, redacted response body
        message: String,
    },

    /// Transport failure
    #[error("request failed: {0}")]
    Http(String),

    /// Response body did not have the expected shape
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Environment override has the wrong type
    #[error("invalid value for {var}: {value}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Rejected value
        value: String,
    },

    /// Values parsed but are not usable
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_partial_writes_are_non_fatal() {
        assert!(!ErrorKind::PartialWriteFailure.is_fatal());
        assert!(ErrorKind::BackendUnavailable.is_fatal());
        assert!(ErrorKind::NoFilesGenerated.is_fatal());
        assert!(PipelineError::NoFilesGenerated { dropped: 1 }.is_fatal());
    }

    #[test]
    fn backend_errors_become_backend_unavailable() {
        let err: PipelineError = BackendError::Timeout { secs: 120 }.into();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
        assert_eq!(
            err.to_string(),
            "generative backend unavailable: backend timed out after 120s"
        );
    }

    #[test]
    fn manifest_errors_convert() {
        let err: PipelineError = ManifestError::InvalidJson("eof".into()).into();
        assert_eq!(err.kind(), ErrorKind::MalformedManifest);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NoFilesGenerated).unwrap();
        assert_eq!(json, "\"no_files_generated\"");
    }
}
