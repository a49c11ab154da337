//! Record of files actually written to disk
//!
//! [`MaterializedSet`] is the authoritative path → content mapping produced by
//! one run. Archiving and publishing both read from it, never from the
//! manifest.

use crate::hash::ContentHash;
use crate::path::RelativePath;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Insertion-ordered mapping from relative path to written content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializedSet {
    files: IndexMap<RelativePath, String>,
}

impl MaterializedSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written file
    ///
    /// Re-inserting a path keeps its original position and replaces content.
    #[inline]
    pub fn insert(&mut self, path: RelativePath, content: String) {
        self.files.insert(path, content);
    }

    /// Content written at `path`
    #[inline]
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(p, _)| p.as_key() == path)
            .map(|(_, c)| c.as_str())
    }

    /// Whether `path` was written
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Number of files
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing was written
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate (path, content) in insertion order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&RelativePath, &str)> {
        self.files.iter().map(|(p, c)| (p, c.as_str()))
    }

    /// Relative paths in insertion order
    #[inline]
    pub fn paths(&self) -> impl Iterator<Item = &RelativePath> {
        self.files.keys()
    }

    /// `/`-joined keys in insertion order
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.files.keys().map(RelativePath::as_key).collect()
    }

    /// Plain string mapping for persistence and publishing
    #[must_use]
    pub fn to_file_map(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .map(|(p, c)| (p.as_key(), c.clone()))
            .collect()
    }

    /// Order-sensitive digest over paths and contents
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        let keys = self.keys();
        ContentHash::compute_pairs(
            keys.iter()
                .zip(self.files.values())
                .map(|(k, c)| (k.as_str(), c.as_bytes())),
        )
    }
}

impl FromIterator<(RelativePath, String)> for MaterializedSet {
    fn from_iter<I: IntoIterator<Item = (RelativePath, String)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl serde::Serialize for MaterializedSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.files.len()))?;
        for (path, content) in &self.files {
            map.serialize_entry(&path.as_key(), content)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathSanitizer;
    use tempfile::TempDir;

    fn rel(s: &PathSanitizer, p: &str) -> RelativePath {
        s.sanitize(p).unwrap()
    }

    #[test]
    fn preserves_insertion_order() {
        let dir = TempDir::new().unwrap();
        let s = PathSanitizer::new(dir.path()).unwrap();

        let mut set = MaterializedSet::new();
        set.insert(rel(&s, "z.txt"), "z".into());
        set.insert(rel(&s, "a.txt"), "a".into());
        set.insert(rel(&s, "m/n.txt"), "n".into());

        assert_eq!(set.keys(), vec!["z.txt", "a.txt", "m/n.txt"]);
        assert_eq!(set.get("m/n.txt"), Some("n"));
        assert!(!set.contains("missing"));
    }

    #[test]
    fn digest_tracks_content() {
        let dir = TempDir::new().unwrap();
        let s = PathSanitizer::new(dir.path()).unwrap();

        let a: MaterializedSet = [(rel(&s, "a.txt"), "one".to_string())].into_iter().collect();
        let b: MaterializedSet = [(rel(&s, "a.txt"), "one".to_string())].into_iter().collect();
        let c: MaterializedSet = [(rel(&s, "a.txt"), "two".to_string())].into_iter().collect();

        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn serializes_as_string_map() {
        let dir = TempDir::new().unwrap();
        let s = PathSanitizer::new(dir.path()).unwrap();
        let set: MaterializedSet = [(rel(&s, "src/a.rs"), "fn a() {}".to_string())]
            .into_iter()
            .collect();

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json, serde_json::json!({ "src/a.rs": "fn a() {}" }));
        assert_eq!(set.to_file_map().get("src/a.rs").map(String::as_str), Some("fn a() {}"));
    }
}
