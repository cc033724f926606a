//! Route manifest: the JSON document routes are loaded from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::grammar::RouteSpec;
use crate::loader::RouteLoadError;

/// One manifest value: a compact route string or a structured object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteEntry {
    Compact(String),
    Structured(RouteSpec),
}

impl RouteEntry {
    /// Typed form of this entry.
    pub fn spec(&self) -> RouteSpec {
        match self {
            Self::Compact(s) => RouteSpec::parse(s),
            Self::Structured(spec) => spec.clone().normalized(),
        }
    }
}

/// Mapping of declared route path to route entry, kept in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteManifest {
    entries: IndexMap<String, RouteEntry>,
}

impl RouteManifest {
    /// Parse a manifest from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RouteLoadError> {
        serde_json::from_slice(bytes).map_err(|e| RouteLoadError::Parse(e.to_string()))
    }

    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RouteLoadError> {
        Self::from_slice(json.as_bytes())
    }

    /// Add an entry, or replace one in place.
    pub fn insert(&mut self, path: impl Into<String>, entry: RouteEntry) {
        self.entries.insert(path.into(), entry);
    }

    /// Declared paths with their typed specs, in document order.
    pub fn specs(&self) -> impl Iterator<Item = (&str, RouteSpec)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.spec()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_entries() {
        let manifest = RouteManifest::from_json(
            r#"{
                "tasks": "todoList@api/todo.php=>list.html",
                "tasks/add": {"rpcFunction": "todoAdd", "rpcPath": "api/todo.php", "template": "task.html"},
                "about": {"template": "about.html"}
            }"#,
        )
        .unwrap();

        let specs: Vec<(&str, RouteSpec)> = manifest.specs().collect();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].0, "tasks");
        assert_eq!(specs[0].1.rpc_function.as_deref(), Some("todoList"));
        assert_eq!(specs[1].1.rpc_path.as_deref(), Some("api/todo.php"));
        assert_eq!(specs[2].0, "about");
        assert_eq!(specs[2].1.template.as_deref(), Some("about.html"));
        assert_eq!(specs[2].1.rpc_function, None);
    }

    #[test]
    fn test_structured_nulls_and_placeholder() {
        let manifest = RouteManifest::from_json(
            r#"{"x": {"rpcFunction": "()", "rpcPath": "todo.php", "template": null}}"#,
        )
        .unwrap();
        let (_, spec) = manifest.specs().next().unwrap();
        assert_eq!(spec.rpc_function, None);
        assert_eq!(spec.template, None);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            RouteManifest::from_json("[1, 2"),
            Err(RouteLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_wrong_shape() {
        assert!(RouteManifest::from_json(r#"["a@b"]"#).is_err());
        assert!(RouteManifest::from_json(r#"{"a": 3}"#).is_err());
    }
}
