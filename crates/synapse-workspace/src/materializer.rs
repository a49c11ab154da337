//! Materializer
//!
//! Writes sanitized entries below the output root. Each write either lands
//! in the resulting [`MaterializedSet`] or becomes a `WriteFailed` warning;
//! one failure never affects the other entries.
//!
//! Writes run with bounded concurrency. Results are collected in source order
//! and merged afterwards, so no shared state is mutated by concurrent tasks.

use crate::plan::plan_writes;
use futures::stream::{self, StreamExt};
use synapse_manifest::{EntryWarning, MaterializedSet, PathSanitizer, SanitizedEntry, WarningKind};

/// Files written plus entries that were dropped on the way
#[derive(Debug, Clone, Default)]
pub struct Materialization {
    /// Files actually on disk
    pub set: MaterializedSet,
    /// Planning and write warnings, ordered by entry index
    pub warnings: Vec<EntryWarning>,
}

/// Writes entries to disk
#[derive(Debug, Clone)]
pub struct Materializer {
    concurrency: usize,
}

impl Default for Materializer {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

impl Materializer {
    /// Create materializer with default concurrency
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With maximum number of concurrent writes (at least 1)
    #[inline]
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Configured write concurrency
    #[inline]
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Write all entries below the sanitizer's root
    ///
    /// Content is written as UTF-8. Parents are created as needed.
    pub async fn materialize(
        &self,
        sanitizer: &PathSanitizer,
        entries: Vec<SanitizedEntry>,
    ) -> Materialization {
        let plan = plan_writes(entries);
        let mut warnings = plan.warnings;

        let outcomes: Vec<(SanitizedEntry, std::io::Result<()>)> = stream::iter(plan.entries)
            .map(|entry| async move {
                let result = write_entry(sanitizer, &entry).await;
                (entry, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut set = MaterializedSet::new();
        for (entry, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    tracing::debug!(path = %entry.relative_path, "Created file");
                    set.insert(entry.relative_path, entry.content);
                }
                Err(e) => {
                    tracing::error!(path = %entry.relative_path, error = %e, "Failed to write file");
                    warnings.push(
                        EntryWarning::new(entry.index, WarningKind::WriteFailed, e.to_string())
                            .with_path(entry.relative_path.to_string()),
                    );
                }
            }
        }
        warnings.sort_by_key(|w| w.index);

        tracing::info!(
            written = set.len(),
            dropped = warnings.len(),
            "Materialized project files"
        );
        Materialization { set, warnings }
    }
}

async fn write_entry(sanitizer: &PathSanitizer, entry: &SanitizedEntry) -> std::io::Result<()> {
    let target = sanitizer.resolve(&entry.relative_path);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, entry.content.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sanitized(sanitizer: &PathSanitizer, pairs: &[(&str, &str)]) -> Vec<SanitizedEntry> {
        pairs
            .iter()
            .enumerate()
            .map(|(index, (path, content))| SanitizedEntry {
                index,
                relative_path: sanitizer.sanitize(path).unwrap(),
                content: (*content).to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn writes_nested_files() {
        let dir = TempDir::new().unwrap();
        let sanitizer = PathSanitizer::new(dir.path()).unwrap();
        let entries = sanitized(
            &sanitizer,
            &[("main.py", "print('hi')"), ("static/css/style.css", "body {}")],
        );

        let result = Materializer::new().materialize(&sanitizer, entries).await;

        assert_eq!(result.set.keys(), vec!["main.py", "static/css/style.css"]);
        assert!(result.warnings.is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("static/css/style.css")).unwrap(),
            "body {}"
        );
    }

    #[tokio::test]
    async fn write_failure_is_isolated() {
        let dir = TempDir::new().unwrap();
        let sanitizer = PathSanitizer::new(dir.path()).unwrap();
        // A directory squatting on the target path makes that single write fail.
        std::fs::create_dir_all(dir.path().join("blocked.txt")).unwrap();
        let entries = sanitized(
            &sanitizer,
            &[("ok1.txt", "1"), ("blocked.txt", "x"), ("ok2.txt", "2")],
        );

        let result = Materializer::new()
            .with_concurrency(1)
            .materialize(&sanitizer, entries)
            .await;

        assert_eq!(result.set.keys(), vec!["ok1.txt", "ok2.txt"]);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::WriteFailed);
        assert_eq!(result.warnings[0].index, 1);
    }

    #[tokio::test]
    async fn unicode_content_is_utf8_on_disk() {
        let dir = TempDir::new().unwrap();
        let sanitizer = PathSanitizer::new(dir.path()).unwrap();
        let entries = sanitized(&sanitizer, &[("greet.txt", "héllo ✓")]);

        Materializer::new().materialize(&sanitizer, entries).await;

        let bytes = std::fs::read(dir.path().join("greet.txt")).unwrap();
        assert_eq!(bytes, "héllo ✓".as_bytes());
    }

    #[test]
    fn concurrency_is_at_least_one() {
        assert_eq!(Materializer::new().with_concurrency(0).concurrency(), 1);
    }
}
