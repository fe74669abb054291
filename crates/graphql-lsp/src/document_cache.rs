//! Editor-owned document text, keyed by file path.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use graphql_extract::CachedContent;
use std::path::{Path, PathBuf};

/// One open document as the editor last sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub version: i32,
    pub text: String,
    /// GraphQL snippets extracted from `text`
    pub contents: Vec<CachedContent>,
}

/// Open documents and their versions.
///
/// Versions only move forward: an update carrying a version that is not
/// strictly greater than the cached one is rejected, so a late change
/// notification can never overwrite newer text.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: DashMap<PathBuf, DocumentEntry>,
}

impl DocumentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly opened document, replacing anything cached for it
    pub fn open(&self, path: PathBuf, entry: DocumentEntry) {
        self.entries.insert(path, entry);
    }

    /// Apply an edit; returns false when `entry` is older than what is cached
    pub fn update(&self, path: PathBuf, entry: DocumentEntry) -> bool {
        match self.entries.entry(path) {
            Entry::Occupied(mut occupied) => {
                if entry.version <= occupied.get().version {
                    tracing::debug!(
                        path = %occupied.key().display(),
                        cached = occupied.get().version,
                        incoming = entry.version,
                        "Rejecting stale document version"
                    );
                    return false;
                }
                occupied.insert(entry);
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                true
            }
        }
    }

    pub fn remove(&self, path: &Path) -> Option<DocumentEntry> {
        self.entries.remove(path).map(|(_, entry)| entry)
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<DocumentEntry> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Paths of every open document, sorted
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_extract::{Position, Range};

    fn entry(version: i32, text: &str) -> DocumentEntry {
        DocumentEntry {
            version,
            text: text.to_string(),
            contents: vec![CachedContent::new(
                text,
                Range::new(Position::new(0, 0), Position::new(0, text.len())),
            )],
        }
    }

    #[test]
    fn test_newer_version_wins() {
        let cache = DocumentCache::new();
        let path = PathBuf::from("/project/query.graphql");

        assert!(cache.update(path.clone(), entry(1, "{ a }")));
        assert!(cache.update(path.clone(), entry(2, "{ b }")));
        assert_eq!(cache.get(&path).unwrap().text, "{ b }");
    }

    #[test]
    fn test_stale_version_is_rejected() {
        let cache = DocumentCache::new();
        let path = PathBuf::from("/project/query.graphql");

        assert!(cache.update(path.clone(), entry(2, "{ new }")));
        assert!(!cache.update(path.clone(), entry(1, "{ old }")));
        assert!(!cache.update(path.clone(), entry(2, "{ same }")));

        let cached = cache.get(&path).unwrap();
        assert_eq!(cached.version, 2);
        assert_eq!(cached.text, "{ new }");
    }

    #[test]
    fn test_open_replaces_and_remove_forgets() {
        let cache = DocumentCache::new();
        let path = PathBuf::from("/project/query.graphql");

        cache.update(path.clone(), entry(5, "{ a }"));
        cache.open(path.clone(), entry(1, "{ reopened }"));
        assert_eq!(cache.get(&path).unwrap().version, 1);
        assert_eq!(cache.paths(), vec![path.clone()]);

        assert!(cache.remove(&path).is_some());
        assert!(!cache.contains(&path));
    }
}
