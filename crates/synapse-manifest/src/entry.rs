//! Manifest entries
//!
//! - [`FileEntry`]: one declared file exactly as the model produced it
//! - [`Manifest`]: ordered list of entries from one response
//! - [`SanitizedEntry`]: an entry whose path is proven to stay inside the output root

use crate::path::RelativePath;

/// A declared file from the model response
///
/// The path is untrusted: it may be absolute, relative or contain `..`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    index: usize,
    declared_path: String,
    content: String,
}

impl FileEntry {
    /// Create entry at the given source position
    #[inline]
    #[must_use]
    pub fn new(index: usize, declared_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            index,
            declared_path: declared_path.into(),
            content: content.into(),
        }
    }

    /// Position in the source array
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Path as declared by the model
    #[inline]
    #[must_use]
    pub fn declared_path(&self) -> &str {
        &self.declared_path
    }

    /// File content
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Split into (path, content)
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.declared_path, self.content)
    }
}

/// Ordered entries parsed from one response
///
/// Order matches the source array. It carries no meaning downstream but keeps
/// logs and tests deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<FileEntry>,
}

impl Manifest {
    /// Create manifest from entries
    #[inline]
    #[must_use]
    pub fn new(entries: Vec<FileEntry>) -> Self {
        Self { entries }
    }

    /// Entries in source order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries survived validation
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }
}

impl IntoIterator for Manifest {
    type Item = FileEntry;
    type IntoIter = std::vec::IntoIter<FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Entry whose relative path resolves strictly inside the output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedEntry {
    /// Position of the originating entry
    pub index: usize,
    /// Normalized path, relative to the output root
    pub relative_path: RelativePath,
    /// File content
    pub content: String,
}
