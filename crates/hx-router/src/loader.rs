//! Route manifest loading.
//!
//! Loading never aborts the worker: a manifest that cannot be fetched or
//! parsed leaves whatever routes were already registered in place.

use futures::future::join_all;
use hx_cache::CacheManager;
use hx_core::WorkerScope;
use hx_fetch::{get_request, Network};
use thiserror::Error;

use crate::manifest::RouteManifest;
use crate::table::RouteTable;

/// Errors that can occur while loading a route manifest.
#[derive(Error, Debug)]
pub enum RouteLoadError {
    #[error("invalid manifest location {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("failed to fetch route manifest {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("route manifest {url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid route manifest: {0}")]
    Parse(String),
}

/// Fetch and parse the route manifest at `source` (relative to the scope).
pub async fn fetch_manifest(
    network: &dyn Network,
    scope: &WorkerScope,
    source: &str,
) -> Result<RouteManifest, RouteLoadError> {
    let url = scope
        .resolve(source)
        .map_err(|e| RouteLoadError::InvalidPath {
            path: source.to_string(),
            reason: e.to_string(),
        })?;

    let request = get_request(&url).map_err(|e| RouteLoadError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let response = network
        .fetch(request)
        .await
        .map_err(|e| RouteLoadError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(RouteLoadError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    RouteManifest::from_slice(response.body())
}

impl RouteTable {
    /// Register every manifest entry. Returns the template paths referenced.
    pub fn register_manifest(&mut self, manifest: &RouteManifest) -> Vec<String> {
        let mut templates = Vec::new();
        for (declared, spec) in manifest.specs() {
            let route = self.add_spec(declared, &spec);
            if let Some(path) = &route.template_path {
                if !templates.contains(path) {
                    templates.push(path.clone());
                }
            }
        }
        templates
    }

    /// Fetch, parse and register the manifest at `source`, then prime the
    /// current cache generation with every referenced template.
    ///
    /// Priming is skipped once the generation is marked ready: activation
    /// already stored every template in the manifest.
    ///
    /// Returns the number of manifest entries registered.
    pub async fn load_routes(
        &mut self,
        network: &dyn Network,
        cache: &CacheManager,
        source: &str,
    ) -> Result<usize, RouteLoadError> {
        let manifest = fetch_manifest(network, self.scope(), source).await?;
        let templates = self.register_manifest(&manifest);

        tracing::info!(
            source,
            routes = manifest.len(),
            templates = templates.len(),
            "routes loaded"
        );

        match cache.is_ready().await {
            Ok(true) => tracing::debug!(source, "cache generation ready, templates not primed"),
            _ => prime_templates(cache, &templates).await,
        }
        Ok(manifest.len())
    }

    /// Like [`RouteTable::load_routes`], but failures are logged and the
    /// table is left as it was.
    pub async fn load_routes_or_log(
        &mut self,
        network: &dyn Network,
        cache: &CacheManager,
        source: &str,
    ) -> usize {
        match self.load_routes(network, cache, source).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(source, error = %e, "failed to load routes");
                0
            }
        }
    }
}

/// Add each template to the current cache generation. Failures are logged.
pub async fn prime_templates(cache: &CacheManager, paths: &[String]) {
    let primes = paths.iter().map(|path| async move {
        if let Err(e) = cache.add(path).await {
            tracing::warn!(template = %path, error = %e, "failed to prime template");
        }
    });
    join_all(primes).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use hx_cache::{CacheManifest, CacheStorage, InMemoryCacheStorage};
    use hx_fetch::StaticNetwork;

    const ROUTES: &str = r#"{
        "tasks": "todoList@api/todo.php=>list.html",
        "tasks/add": "todoAdd@api/todo.php=>task.html",
        "tasks/delete": "todoDelete@api/todo.php",
        "about": {"template": "task.html"}
    }"#;

    fn scope() -> WorkerScope {
        WorkerScope::new("https://example.com", "/app/").unwrap()
    }

    fn table() -> RouteTable {
        RouteTable::new(
            scope(),
            "templates",
            CacheManifest::from_paths(["index.html", "styles.css"]),
        )
    }

    fn cache(network: &StaticNetwork, storage: &InMemoryCacheStorage) -> CacheManager {
        CacheManager::new(
            Arc::new(storage.clone()),
            Arc::new(network.clone()),
            scope(),
            "cs-htmx",
        )
    }

    #[tokio::test]
    async fn test_load_routes_registers_and_primes() {
        let network = StaticNetwork::new()
            .with_body("https://example.com/app/routes.json", ROUTES)
            .with_body("https://example.com/app/templates/list.html", "<ul></ul>")
            .with_body("https://example.com/app/templates/task.html", "<li></li>");
        let storage = InMemoryCacheStorage::new();
        let cache = cache(&network, &storage);

        let mut table = table();
        let count = table
            .load_routes(&network, &cache, "routes.json")
            .await
            .unwrap();

        assert_eq!(count, 4);
        assert_eq!(table.len(), 4);
        assert!(table.lookup("/app/tasks/delete").unwrap().template_path.is_none());
        assert_eq!(
            table.cache_manifest().paths(),
            [
                "index.html",
                "styles.css",
                "templates/list.html",
                "templates/task.html"
            ]
        );

        let cached = storage.urls("cs-htmx").await.unwrap();
        assert_eq!(
            cached,
            vec![
                "https://example.com/app/templates/list.html",
                "https://example.com/app/templates/task.html"
            ]
        );
    }

    #[tokio::test]
    async fn test_ready_generation_is_not_primed() {
        let network = StaticNetwork::new()
            .with_body("https://example.com/app/routes.json", ROUTES)
            .with_body("https://example.com/app/templates/list.html", "<ul></ul>")
            .with_body("https://example.com/app/templates/task.html", "<li></li>");
        let storage = InMemoryCacheStorage::new();
        let cache = cache(&network, &storage);
        cache.mark_ready().await.unwrap();

        for _ in 0..3 {
            let mut table = table();
            assert_eq!(table.load_routes(&network, &cache, "routes.json").await.unwrap(), 4);
        }

        assert_eq!(network.fetch_count("https://example.com/app/templates/list.html"), 0);
        assert_eq!(network.fetch_count("https://example.com/app/templates/task.html"), 0);
    }

    #[tokio::test]
    async fn test_prime_failure_is_not_fatal() {
        let network = StaticNetwork::new().with_body(
            "https://example.com/app/routes.json",
            r#"{"tasks": "todoList@api/todo.php=>missing.html"}"#,
        );
        let storage = InMemoryCacheStorage::new();
        let cache = cache(&network, &storage);

        let mut table = table();
        let count = table
            .load_routes(&network, &cache, "routes.json")
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert!(table.lookup("/app/tasks").is_some());
        assert!(storage.urls("cs-htmx").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_colliding_keys_follow_document_order() {
        let network = StaticNetwork::new().with_body(
            "https://example.com/app/routes.json",
            r#"{"tasks": "first@todo.php=>one.html", "/tasks": "second@todo.php=>two.html"}"#,
        );
        let storage = InMemoryCacheStorage::new();
        let cache = cache(&network, &storage);

        let mut table = table();
        table
            .load_routes(&network, &cache, "routes.json")
            .await
            .unwrap();

        assert_eq!(table.len(), 1);
        let route = table.lookup("/app/tasks").unwrap();
        assert_eq!(route.rpc_function.as_deref(), Some("second"));
        assert_eq!(route.template_path.as_deref(), Some("templates/two.html"));
    }

    #[tokio::test]
    async fn test_parse_failure_keeps_existing_routes() {
        let network = StaticNetwork::new().with_body("https://example.com/app/routes.json", "{oops");
        let storage = InMemoryCacheStorage::new();
        let cache = cache(&network, &storage);

        let mut table = table();
        table.add_route("home", None, None, Some("home.html"));

        let err = table
            .load_routes(&network, &cache, "routes.json")
            .await
            .unwrap_err();
        assert!(matches!(err, RouteLoadError::Parse(_)));

        assert_eq!(table.load_routes_or_log(&network, &cache, "routes.json").await, 0);
        assert_eq!(table.len(), 1);
        assert!(table.lookup("/app/home").is_some());
    }

    #[tokio::test]
    async fn test_fetch_failures() {
        let network = StaticNetwork::new().with_status("https://example.com/app/routes.json", 500, "");

        let err = fetch_manifest(&network, &scope(), "routes.json").await.unwrap_err();
        assert!(matches!(err, RouteLoadError::Status { status: 500, .. }));

        let err = fetch_manifest(&network, &scope(), "other.json").await.unwrap_err();
        assert!(matches!(err, RouteLoadError::Fetch { .. }));
    }
}
