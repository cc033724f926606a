//! The install-time cache manifest.

use serde::{Deserialize, Serialize};

/// Ordered, deduplicated set of resource paths cached at install time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheManifest {
    paths: Vec<String>,
}

impl CacheManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manifest from static asset paths.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manifest = Self::new();
        for path in paths {
            manifest.insert(path);
        }
        manifest
    }

    /// Add a path. Returns `false` if it was already present.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Whether the manifest lists a path.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Paths in insertion order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paths_dedups() {
        let manifest = CacheManifest::from_paths(["index.html", "styles.css", "index.html"]);
        assert_eq!(manifest.paths(), ["index.html", "styles.css"]);
    }

    #[test]
    fn test_insert_reports_new() {
        let mut manifest = CacheManifest::new();
        assert!(manifest.insert("templates/task.html"));
        assert!(!manifest.insert("templates/task.html"));
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_serializes_as_list() {
        let manifest = CacheManifest::from_paths(["a", "b"]);
        assert_eq!(serde_json::to_string(&manifest).unwrap(), r#"["a","b"]"#);
    }
}
