//! The route table.

use std::collections::HashMap;

use hx_cache::CacheManifest;
use hx_core::{ConfigError, WorkerConfig, WorkerScope};
use serde::Serialize;

use crate::grammar::RouteSpec;

/// What a route does: optionally call a remote procedure, optionally render a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteDescriptor {
    /// Template path (template directory joined with the file name).
    pub template_path: Option<String>,
    /// RPC endpoint path.
    pub rpc_path: Option<String>,
    /// RPC method name.
    pub rpc_function: Option<String>,
}

impl RouteDescriptor {
    /// The RPC binding, present only when both path and function are set.
    pub fn rpc_binding(&self) -> Option<(&str, &str)> {
        match (&self.rpc_path, &self.rpc_function) {
            (Some(path), Some(function)) => Some((path.as_str(), function.as_str())),
            _ => None,
        }
    }
}

/// Mapping of absolute route path to route descriptor.
///
/// Built once at startup; request handling only reads it.
#[derive(Debug, Clone)]
pub struct RouteTable {
    scope: WorkerScope,
    template_dir: String,
    routes: HashMap<String, RouteDescriptor>,
    manifest: CacheManifest,
}

impl RouteTable {
    /// Create an empty table.
    ///
    /// `manifest` starts out with the static assets; template paths are
    /// appended as routes are registered.
    pub fn new(scope: WorkerScope, template_dir: impl Into<String>, manifest: CacheManifest) -> Self {
        Self {
            scope,
            template_dir: template_dir.into(),
            routes: HashMap::new(),
            manifest,
        }
    }

    /// Create an empty table for a deployment.
    pub fn from_config(config: &WorkerConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.scope()?,
            config.template_dir.clone(),
            CacheManifest::from_paths(config.static_assets.iter().cloned()),
        ))
    }

    /// Scope route keys are built in.
    pub fn scope(&self) -> &WorkerScope {
        &self.scope
    }

    /// Register a route under `<base_path><declared>`. The last registration for a key wins.
    ///
    /// Returns the registered descriptor.
    pub fn add_route(
        &mut self,
        declared: &str,
        rpc_path: Option<&str>,
        rpc_function: Option<&str>,
        template_file: Option<&str>,
    ) -> &RouteDescriptor {
        let template_path = template_file.map(|file| self.template_path(file));

        if let Some(path) = &template_path {
            self.manifest.insert(path.clone());
        }

        let key = self.scope.route_key(declared);
        let descriptor = RouteDescriptor {
            template_path,
            rpc_path: rpc_path.map(String::from),
            rpc_function: rpc_function.map(String::from),
        };

        self.routes.insert(key.clone(), descriptor);
        &self.routes[&key]
    }

    /// Register a parsed route spec.
    pub fn add_spec(&mut self, declared: &str, spec: &RouteSpec) -> &RouteDescriptor {
        self.add_route(
            declared,
            spec.rpc_path.as_deref(),
            spec.rpc_function.as_deref(),
            spec.template.as_deref(),
        )
    }

    /// Look up a route by absolute path.
    pub fn lookup(&self, path: &str) -> Option<&RouteDescriptor> {
        self.routes.get(path)
    }

    /// Full path of a template file.
    pub fn template_path(&self, file: &str) -> String {
        format!("{}/{}", self.template_dir.trim_end_matches('/'), file)
    }

    /// Cache manifest: static assets plus every registered template path.
    pub fn cache_manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    /// Registered routes sorted by path.
    pub fn routes(&self) -> Vec<(&str, &RouteDescriptor)> {
        let mut routes: Vec<_> = self
            .routes
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        routes.sort_by(|a, b| a.0.cmp(b.0));
        routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        let scope = WorkerScope::new("https://example.com", "/app/").unwrap();
        RouteTable::new(
            scope,
            "templates/",
            CacheManifest::from_paths(["index.html", "styles.css"]),
        )
    }

    #[test]
    fn test_lookup_exact_key() {
        let mut table = table();
        table.add_route("tasks", Some("todo.php"), Some("todoList"), Some("list.html"));

        let route = table.lookup("/app/tasks").unwrap();
        assert_eq!(route.template_path.as_deref(), Some("templates/list.html"));
        assert_eq!(route.rpc_binding(), Some(("todo.php", "todoList")));

        assert!(table.lookup("/app/tasks/").is_none());
        assert!(table.lookup("/tasks").is_none());
        assert!(table.lookup("/app/other").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut table = table();
        table.add_route("tasks", None, None, Some("a.html"));
        table.add_route("tasks", None, None, Some("b.html"));

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.lookup("/app/tasks").unwrap().template_path.as_deref(),
            Some("templates/b.html")
        );
    }

    #[test]
    fn test_templates_join_manifest_once() {
        let mut table = table();
        table.add_route("a", None, None, Some("task.html"));
        table.add_route("b", None, None, Some("task.html"));
        table.add_route("c", Some("todo.php"), Some("todoDelete"), None);

        assert_eq!(
            table.cache_manifest().paths(),
            ["index.html", "styles.css", "templates/task.html"]
        );
    }

    #[test]
    fn test_rpc_binding_needs_both_parts() {
        let mut table = table();
        let route = table.add_route("x", Some("todo.php"), None, None);
        assert_eq!(route.rpc_binding(), None);
    }

    #[test]
    fn test_add_spec() {
        let mut table = table();
        let spec = RouteSpec::parse("addTask@todo.php=>task.html");
        table.add_spec("/tasks/add", &spec);

        let route = table.lookup("/app/tasks/add").unwrap();
        assert_eq!(route.rpc_function.as_deref(), Some("addTask"));
        assert_eq!(route.rpc_path.as_deref(), Some("todo.php"));
        assert_eq!(route.template_path.as_deref(), Some("templates/task.html"));
    }

    #[test]
    fn test_from_config() {
        let config = WorkerConfig::new("https://example.com").with_base_path("app");
        let table = RouteTable::from_config(&config).unwrap();
        assert_eq!(table.scope().base_path(), "/app/");
        assert_eq!(table.template_path("x.html"), "templates/x.html");
        assert_eq!(table.cache_manifest().paths(), ["index.html", "styles.css"]);
    }

    #[test]
    fn test_routes_sorted() {
        let mut table = table();
        table.add_route("b", None, None, None);
        table.add_route("a", None, None, None);
        let keys: Vec<&str> = table.routes().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["/app/a", "/app/b"]);
    }
}
