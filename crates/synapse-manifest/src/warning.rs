//! Per-entry diagnostics
//!
//! A generated manifest is processed entry by entry. Anything that drops a
//! single entry is recorded as an [`EntryWarning`] instead of failing the
//! whole run.

use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Why an entry was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Array element is not an object, or lacks the path or content field
    MissingField,
    /// Path or content field is present but not a string
    InvalidFieldType,
    /// Declared path would resolve outside the output root
    UnsafePath,
    /// A later entry declared the same relative path
    DuplicatePath,
    /// Entry would need to be both a file and a directory
    PathConflict,
    /// Writing the file to disk failed
    WriteFailed,
}

impl WarningKind {
    /// Stable identifier used in logs and CLI output
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidFieldType => "invalid_field_type",
            Self::UnsafePath => "unsafe_path",
            Self::DuplicatePath => "duplicate_path",
            Self::PathConflict => "path_conflict",
            Self::WriteFailed => "write_failed",
        }
    }
}

impl Display for WarningKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal problem with one manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryWarning {
    /// Position of the entry in the source array
    pub index: usize,
    /// Declared path, when one could be read
    pub declared_path: Option<String>,
    /// Classification
    pub kind: WarningKind,
    /// Human-readable detail
    pub detail: String,
}

impl EntryWarning {
    /// Create a new warning
    #[inline]
    #[must_use]
    pub fn new(index: usize, kind: WarningKind, detail: impl Into<String>) -> Self {
        Self {
            index,
            declared_path: None,
            kind,
            detail: detail.into(),
        }
    }

    /// Attach the declared path
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.declared_path = Some(path.into());
        self
    }
}

impl Display for EntryWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.declared_path {
            Some(path) => write!(
                f,
                "entry {} ({path}): {}: {}",
                self.index, self.kind, self.detail
            ),
            None => write!(f, "entry {}: {}: {}", self.index, self.kind, self.detail),
        }
    }
}
