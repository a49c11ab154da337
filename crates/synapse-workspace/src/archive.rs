//! Archiver
//!
//! Bundles a [`MaterializedSet`] into a deflate-compressed zip. Entry names
//! are the set's relative paths in insertion order. Timestamps and
//! permissions are fixed so identical inputs produce identical archives.
//!
//! A successful archive is returned as an [`ArchiveHandle`], which deletes the
//! file when dropped unless the caller keeps it.

use crate::error::ArchiveError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use synapse_manifest::{ContentHash, MaterializedSet};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Owned archive on disk
///
/// The file is removed when the handle is dropped, on every exit path,
/// unless [`ArchiveHandle::keep`] was called first.
#[derive(Debug)]
pub struct ArchiveHandle {
    path: PathBuf,
    entries: usize,
    digest: ContentHash,
    keep: bool,
}

impl ArchiveHandle {
    /// Archive location
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries written
    #[inline]
    #[must_use]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Blake3 digest of the archive bytes
    #[inline]
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        self.digest
    }

    /// Disarm cleanup and return the path; the caller now owns the file
    #[must_use]
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ArchiveHandle {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::info!(path = %self.path.display(), "Cleaned up archive"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to clean up archive");
            }
        }
    }
}

/// Zip archiver
#[derive(Debug, Clone, Copy)]
pub struct Archiver {
    compression: CompressionMethod,
}

impl Default for Archiver {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl Archiver {
    /// Create deflate archiver
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `set` to `archive_path`, replacing any existing file
    ///
    /// Returns `Ok(None)` without touching the disk when `set` is empty:
    /// "nothing to archive" is distinct from an empty archive.
    ///
    /// # Errors
    /// - `ArchiveError::Io` if the file cannot be created or read back
    /// - `ArchiveError::Zip` if encoding fails
    /// - `ArchiveError::Task` if the blocking task panics
    pub async fn archive(
        &self,
        set: &MaterializedSet,
        archive_path: &Path,
    ) -> Result<Option<ArchiveHandle>, ArchiveError> {
        if set.is_empty() {
            tracing::warn!("No files to archive, archive not created");
            return Ok(None);
        }

        let files: Vec<(String, String)> = set
            .iter()
            .map(|(path, content)| (path.as_key(), content.to_string()))
            .collect();
        let path = archive_path.to_path_buf();
        let compression = self.compression;

        let handle = tokio::task::spawn_blocking(move || write_zip(&path, &files, compression))
            .await
            .map_err(|e| ArchiveError::Task(e.to_string()))??;

        tracing::info!(
            path = %handle.path.display(),
            entries = handle.entries,
            digest = %handle.digest.short(),
            "Created archive"
        );
        Ok(Some(handle))
    }
}

fn write_zip(
    path: &Path,
    files: &[(String, String)],
    compression: CompressionMethod,
) -> Result<ArchiveHandle, ArchiveError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ArchiveError::io_error(parent, e))?;
    }

    let file = File::create(path).map_err(|e| ArchiveError::io_error(path, e))?;
    // Dropped on any error below, which removes the partial file.
    let mut handle = ArchiveHandle {
        path: path.to_path_buf(),
        entries: 0,
        digest: ContentHash::default(),
        keep: false,
    };

    let options = SimpleFileOptions::default()
        .compression_method(compression)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut zip = ZipWriter::new(file);
    for (name, content) in files {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(content.as_bytes())
            .map_err(|e| ArchiveError::io_error(path, e))?;
        handle.entries += 1;
        tracing::debug!(entry = %name, "Added to archive");
    }
    zip.finish()?;

    let bytes = std::fs::read(path).map_err(|e| ArchiveError::io_error(path, e))?;
    handle.digest = ContentHash::compute(&bytes);
    Ok(handle)
}
