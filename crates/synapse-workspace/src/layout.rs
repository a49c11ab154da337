//! Output layout
//!
//! [`OutputLayout`] pairs the directory files are written into with the
//! archive destination, and performs the destructive reset that starts every
//! run so no stale files leak between runs.

use crate::error::WorkspaceError;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use synapse_manifest::PathSanitizer;

/// Output root and archive destination for one pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    output_root: PathBuf,
    archive_path: PathBuf,
}

impl OutputLayout {
    /// Create layout
    ///
    /// # Errors
    /// - `WorkspaceError::UnsafeRoot` if the root is empty or a filesystem root
    /// - `WorkspaceError::ArchiveInsideRoot` if the archive would be written into the root
    pub fn new(
        output_root: impl Into<PathBuf>,
        archive_path: impl Into<PathBuf>,
    ) -> Result<Self, WorkspaceError> {
        let output_root = output_root.into();
        let archive_path = archive_path.into();

        if output_root.as_os_str().is_empty() || output_root.parent().is_none() {
            return Err(WorkspaceError::UnsafeRoot(output_root));
        }
        if lexical_absolute(&archive_path).starts_with(lexical_absolute(&output_root)) {
            return Err(WorkspaceError::ArchiveInsideRoot {
                archive: archive_path,
                root: output_root,
            });
        }

        Ok(Self {
            output_root,
            archive_path,
        })
    }

    /// Directory generated files are written into
    #[inline]
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Archive destination
    #[inline]
    #[must_use]
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Remove any stale archive, recreate the output root empty and bind a
    /// sanitizer to it
    ///
    /// Idempotent: missing paths are not an error. A regular file or symlink
    /// found at the root path is removed like a stale directory.
    ///
    /// # Errors
    /// - `WorkspaceError::Io` if removal or creation fails
    /// - `WorkspaceError::Root` if the fresh root cannot be canonicalized
    /// - `WorkspaceError::ArchiveInsideRoot` if the resolved archive path lands in the root
    pub async fn reset(&self) -> Result<PathSanitizer, WorkspaceError> {
        match tokio::fs::remove_file(&self.archive_path).await {
            Ok(()) => tracing::info!(path = %self.archive_path.display(), "Removed existing archive"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(WorkspaceError::io_error(&self.archive_path, e)),
        }

        match tokio::fs::symlink_metadata(&self.output_root).await {
            Ok(meta) => {
                let removed = if meta.is_dir() {
                    tokio::fs::remove_dir_all(&self.output_root).await
                } else {
                    tokio::fs::remove_file(&self.output_root).await
                };
                removed.map_err(|e| WorkspaceError::io_error(&self.output_root, e))?;
                tracing::info!(
                    path = %self.output_root.display(),
                    "Removed existing project directory"
                );
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(WorkspaceError::io_error(&self.output_root, e)),
        }

        tokio::fs::create_dir_all(&self.output_root)
            .await
            .map_err(|e| WorkspaceError::io_error(&self.output_root, e))?;

        let sanitizer = PathSanitizer::new(&self.output_root)?;
        let archive = resolve_archive(&self.archive_path);
        if archive.starts_with(sanitizer.root()) {
            return Err(WorkspaceError::ArchiveInsideRoot {
                archive,
                root: sanitizer.root().to_path_buf(),
            });
        }
        Ok(sanitizer)
    }
}

/// Absolute form of `path` with `.` and `..` collapsed, without touching the
/// filesystem
fn lexical_absolute(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    resolved
}

/// Archive path with its parent directory canonicalized when it exists
fn resolve_archive(archive: &Path) -> PathBuf {
    let canonical_parent = archive
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .and_then(|parent| std::fs::canonicalize(parent).ok());
    match (canonical_parent, archive.file_name()) {
        (Some(parent), Some(name)) => parent.join(name),
        _ => lexical_absolute(archive),
    }
}
