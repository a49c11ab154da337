//! Write planning
//!
//! Resolves collisions between sanitized entries before anything touches the
//! disk, so the writes that follow own disjoint paths and can run
//! concurrently:
//! - duplicate paths: the later entry wins
//! - file/directory conflicts (`docs` and `docs/index.md`): the entry that
//!   would have to be a directory is dropped

use synapse_manifest::{EntryWarning, SanitizedEntry, WarningKind};

/// Entries cleared for writing plus what was dropped
#[derive(Debug, Clone, Default)]
pub struct WritePlan {
    /// Entries with pairwise disjoint paths, in source order
    pub entries: Vec<SanitizedEntry>,
    /// One warning per dropped entry
    pub warnings: Vec<EntryWarning>,
}

/// Build a collision-free plan
#[must_use]
pub fn plan_writes(entries: Vec<SanitizedEntry>) -> WritePlan {
    let mut warnings = Vec::new();

    // Later duplicates replace earlier ones.
    let mut kept: Vec<SanitizedEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(pos) = kept
            .iter()
            .position(|k| k.relative_path == entry.relative_path)
        {
            let replaced = kept.remove(pos);
            tracing::warn!(
                path = %replaced.relative_path,
                index = replaced.index,
                replaced_by = entry.index,
                "Duplicate file path, keeping later entry"
            );
            warnings.push(
                EntryWarning::new(
                    replaced.index,
                    WarningKind::DuplicatePath,
                    format!("replaced by entry {}", entry.index),
                )
                .with_path(replaced.relative_path.to_string()),
            );
        }
        kept.push(entry);
    }

    let (conflicting, clear): (Vec<_>, Vec<_>) = kept.iter().cloned().partition(|candidate| {
        kept.iter()
            .any(|other| candidate.relative_path.is_ancestor_of(&other.relative_path))
    });

    for entry in conflicting {
        tracing::warn!(path = %entry.relative_path, "File path is also a directory of another entry");
        warnings.push(
            EntryWarning::new(
                entry.index,
                WarningKind::PathConflict,
                "path is used as a directory by another entry",
            )
            .with_path(entry.relative_path.to_string()),
        );
    }

    let mut entries = clear;
    entries.sort_by_key(|e| e.index);
    warnings.sort_by_key(|w| w.index);
    WritePlan { entries, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synapse_manifest::PathSanitizer;
    use tempfile::TempDir;

    fn entries(pairs: &[(&str, &str)]) -> (TempDir, Vec<SanitizedEntry>) {
        let dir = TempDir::new().unwrap();
        let sanitizer = PathSanitizer::new(dir.path()).unwrap();
        let entries = pairs
            .iter()
            .enumerate()
            .map(|(index, (path, content))| SanitizedEntry {
                index,
                relative_path: sanitizer.sanitize(path).unwrap(),
                content: (*content).to_string(),
            })
            .collect();
        (dir, entries)
    }

    #[test]
    fn disjoint_paths_pass_through() {
        let (_dir, input) = entries(&[("a.txt", "a"), ("src/b.rs", "b")]);
        let plan = plan_writes(input);
        assert_eq!(plan.entries.len(), 2);
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn later_duplicate_wins() {
        let (_dir, input) = entries(&[("a.txt", "first"), ("b.txt", "b"), ("./a.txt", "second")]);
        let plan = plan_writes(input);

        let kept: Vec<_> = plan
            .entries
            .iter()
            .map(|e| (e.relative_path.to_string(), e.content.as_str()))
            .collect();
        assert_eq!(
            kept,
            vec![("b.txt".to_string(), "b"), ("a.txt".to_string(), "second")]
        );
        assert_eq!(plan.warnings.len(), 1);
        assert_eq!(plan.warnings[0].kind, WarningKind::DuplicatePath);
        assert_eq!(plan.warnings[0].index, 0);
    }

    #[test]
    fn file_directory_conflict_drops_the_shorter_path() {
        let (_dir, input) = entries(&[("docs", "x"), ("docs/index.md", "# hi")]);
        let plan = plan_writes(input);

        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].relative_path.to_string(), "docs/index.md");
        assert_eq!(plan.warnings[0].kind, WarningKind::PathConflict);
    }
}
