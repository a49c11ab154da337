//! Path sanitization
//!
//! Declared file paths come straight from model output and are treated as
//! adversarial. [`PathSanitizer`] turns them into [`RelativePath`]s that are
//! guaranteed to resolve strictly below the output root.
//!
//! Containment is checked twice: lexically while collapsing `.`/`..`
//! segments, then component-wise against the canonicalized root. String
//! prefix matching is never used, so `/out` does not contain `/outside`.

use crate::entry::{FileEntry, Manifest, SanitizedEntry};
use crate::warning::{EntryWarning, WarningKind};
use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};

/// Normalized path relative to an output root
///
/// Segments are joined with `/` regardless of platform so the same key is
/// used for disk writes, archive entry names and publishing.
///
/// # Examples
/// - `src/main.rs` → `["src", "main.rs"]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativePath(Vec<String>);

impl RelativePath {
    /// Path segments from root to leaf
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: an empty path is rejected at construction
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Final segment (the file name)
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Check if this path is a strict ancestor of another
    ///
    /// `src` is an ancestor of `src/main.rs`; a path is never its own ancestor.
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// `/`-joined form
    #[inline]
    #[must_use]
    pub fn as_key(&self) -> String {
        self.0.join("/")
    }

    /// Native path relative to the root
    #[inline]
    #[must_use]
    pub fn to_path_buf(&self) -> PathBuf {
        self.0.iter().collect()
    }
}

impl Display for RelativePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl serde::Serialize for RelativePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_key())
    }
}

/// Errors related to declared paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Nothing left after normalization
    #[error("path is empty after normalization")]
    EmptyPath,

    /// Contains characters no filesystem accepts
    #[error("path contains a NUL byte")]
    InvalidCharacter,

    /// Segment is not a plain file or directory name on this platform
    #[error("invalid segment: {0}")]
    InvalidSegment(String),

    /// Would resolve outside the output root
    #[error("path '{0}' escapes the output root")]
    EscapesRoot(String),

    /// Output root could not be resolved
    #[error("output root {path} is unavailable: {message}")]
    RootUnavailable { path: PathBuf, message: String },
}

/// Check that `candidate` lies strictly below `root`
///
/// Compares path components, not strings.
#[inline]
#[must_use]
pub fn is_strict_descendant(root: &Path, candidate: &Path) -> bool {
    candidate != root && candidate.starts_with(root)
}

/// Sanitizer bound to one canonicalized output root
#[derive(Debug, Clone)]
pub struct PathSanitizer {
    root: PathBuf,
}

impl PathSanitizer {
    /// Bind to an existing output root
    ///
    /// The root is canonicalized so symlinked or relative roots compare
    /// correctly.
    ///
    /// # Errors
    /// Returns `PathError::RootUnavailable` if the root cannot be canonicalized
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PathError> {
        let root = root.as_ref();
        let canonical = std::fs::canonicalize(root).map_err(|e| PathError::RootUnavailable {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self { root: canonical })
    }

    /// Canonical output root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute on-disk location of a sanitized path
    #[inline]
    #[must_use]
    pub fn resolve(&self, path: &RelativePath) -> PathBuf {
        self.root.join(path.to_path_buf())
    }

    /// Sanitize one declared path
    ///
    /// Leading `/` and `\` are stripped, both are treated as separators,
    /// `.` segments are dropped and `..` pops the previous segment.
    ///
    /// # Errors
    /// - `PathError::EscapesRoot` if `..` climbs above the root
    /// - `PathError::EmptyPath` if the path resolves to the root itself
    /// - `PathError::InvalidSegment` for drive prefixes and similar
    /// - `PathError::InvalidCharacter` for NUL bytes
    pub fn sanitize(&self, declared: &str) -> Result<RelativePath, PathError> {
        if declared.contains('\0') {
            return Err(PathError::InvalidCharacter);
        }

        let trimmed = declared.trim_start_matches(['/', '\\']);
        let mut segments: Vec<String> = Vec::new();

        for segment in trimmed.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PathError::EscapesRoot(declared.to_string()));
                    }
                }
                other => {
                    let mut components = Path::new(other).components();
                    match (components.next(), components.next()) {
                        (Some(Component::Normal(_)), None) => segments.push(other.to_string()),
                        _ => return Err(PathError::InvalidSegment(other.to_string())),
                    }
                }
            }
        }

        if segments.is_empty() {
            return Err(PathError::EmptyPath);
        }

        let relative = RelativePath(segments);
        if !is_strict_descendant(&self.root, &self.resolve(&relative)) {
            return Err(PathError::EscapesRoot(declared.to_string()));
        }
        Ok(relative)
    }

    /// Sanitize one manifest entry
    ///
    /// # Errors
    /// Same as [`PathSanitizer::sanitize`]
    pub fn sanitize_entry(&self, entry: &FileEntry) -> Result<SanitizedEntry, PathError> {
        let relative_path = self.sanitize(entry.declared_path())?;
        Ok(SanitizedEntry {
            index: entry.index(),
            relative_path,
            content: entry.content().to_string(),
        })
    }

    /// Sanitize every entry, dropping rejected ones with a warning
    #[must_use]
    pub fn sanitize_manifest(&self, manifest: &Manifest) -> SanitizedManifest {
        let mut sanitized = SanitizedManifest::default();
        for entry in manifest {
            match self.sanitize_entry(entry) {
                Ok(ok) => sanitized.entries.push(ok),
                Err(e) => {
                    tracing::warn!(
                        index = entry.index(),
                        path = entry.declared_path(),
                        error = %e,
                        "Rejected unsafe file path"
                    );
                    sanitized.warnings.push(
                        EntryWarning::new(entry.index(), WarningKind::UnsafePath, e.to_string())
                            .with_path(entry.declared_path()),
                    );
                }
            }
        }
        sanitized
    }
}

/// Outcome of sanitizing a manifest
#[derive(Debug, Clone, Default)]
pub struct SanitizedManifest {
    /// Entries that passed, in source order
    pub entries: Vec<SanitizedEntry>,
    /// One warning per rejected entry
    pub warnings: Vec<EntryWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn sanitizer() -> (TempDir, PathSanitizer) {
        let dir = TempDir::new().unwrap();
        let sanitizer = PathSanitizer::new(dir.path()).unwrap();
        (dir, sanitizer)
    }

    #[test]
    fn plain_relative_path() {
        let (_dir, s) = sanitizer();
        let path = s.sanitize("src/main.rs").unwrap();
        assert_eq!(path.segments(), &["src", "main.rs"]);
        assert_eq!(path.to_string(), "src/main.rs");
        assert_eq!(path.file_name(), "main.rs");
    }

    #[test]
    fn leading_separators_are_stripped() {
        let (_dir, s) = sanitizer();
        assert_eq!(s.sanitize("/etc/passwd").unwrap().to_string(), "etc/passwd");
        assert_eq!(s.sanitize("\\\\share\\x").unwrap().to_string(), "share/x");
    }

    #[test]
    fn dot_segments_collapse() {
        let (_dir, s) = sanitizer();
        assert_eq!(s.sanitize("./a/./b//c").unwrap().to_string(), "a/b/c");
        assert_eq!(s.sanitize("a/../b").unwrap().to_string(), "b");
        assert_eq!(s.sanitize("a\\b\\..\\c").unwrap().to_string(), "a/c");
    }

    #[test]
    fn traversal_is_rejected() {
        let (_dir, s) = sanitizer();
        for declared in ["../../etc/passwd", "..\\..\\x", "a/../../b", "../secret.txt"] {
            assert!(
                matches!(s.sanitize(declared), Err(PathError::EscapesRoot(_))),
                "{declared} should escape"
            );
        }
    }

    #[test]
    fn root_itself_is_rejected() {
        let (_dir, s) = sanitizer();
        for declared in ["", "/", ".", "a/..", "\\"] {
            assert_eq!(s.sanitize(declared), Err(PathError::EmptyPath), "{declared:?}");
        }
    }

    #[test]
    fn nul_byte_is_rejected() {
        let (_dir, s) = sanitizer();
        assert_eq!(s.sanitize("a\0b"), Err(PathError::InvalidCharacter));
    }

    #[test]
    fn containment_is_component_aware() {
        assert!(is_strict_descendant(Path::new("/out"), Path::new("/out/a")));
        assert!(!is_strict_descendant(Path::new("/out"), Path::new("/outside/a")));
        assert!(!is_strict_descendant(Path::new("/out"), Path::new("/out")));
    }

    #[test]
    fn missing_root_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            PathSanitizer::new(&missing),
            Err(PathError::RootUnavailable { .. })
        ));
    }

    #[test]
    fn ancestor_relation() {
        let (_dir, s) = sanitizer();
        let dir = s.sanitize("src").unwrap();
        let file = s.sanitize("src/lib.rs").unwrap();
        let sibling = s.sanitize("srcs/lib.rs").unwrap();
        assert!(dir.is_ancestor_of(&file));
        assert!(!file.is_ancestor_of(&dir));
        assert!(!dir.is_ancestor_of(&sibling));
        assert!(!dir.is_ancestor_of(&dir));
    }

    #[test]
    fn sanitize_manifest_records_rejections() {
        let (_dir, s) = sanitizer();
        let manifest = Manifest::new(vec![
            FileEntry::new(0, "ok.txt", "a"),
            FileEntry::new(1, "../bad.txt", "b"),
        ]);
        let result = s.sanitize_manifest(&manifest);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].relative_path.to_string(), "ok.txt");
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::UnsafePath);
        assert_eq!(result.warnings[0].declared_path.as_deref(), Some("../bad.txt"));
    }

    proptest! {
        #[test]
        fn sanitized_paths_never_leave_root(
            parts in proptest::collection::vec(
                prop_oneof![
                    Just("..".to_string()),
                    Just(".".to_string()),
                    Just(String::new()),
                    "[a-z]{1,6}",
                ],
                0..8,
            ),
            sep in prop_oneof![Just("/"), Just("\\")],
            leading in any::<bool>(),
        ) {
            let (_dir, s) = sanitizer();
            let mut declared = parts.join(sep);
            if leading {
                declared.insert_str(0, sep);
            }
            if let Ok(relative) = s.sanitize(&declared) {
                let resolved = s.resolve(&relative);
                prop_assert!(is_strict_descendant(s.root(), &resolved));
                prop_assert!(relative.segments().iter().all(|seg| seg != ".." && seg != "."));
            }
        }
    }
}
