//! Template loading, partial resolution and memoization.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use handlebars::Handlebars;
use hx_cache::CacheManager;
use hx_core::WorkerScope;
use hx_fetch::{get_request, Network, ResponseExt};
use serde_json::Value;

use crate::error::{TemplateError, TemplateResult};
use crate::partials::scan_partials;

type Registry = Arc<RwLock<Handlebars<'static>>>;

/// A compiled template bound to the engine's partial registry.
#[derive(Clone)]
pub struct Renderer {
    name: String,
    registry: Registry,
}

impl Renderer {
    /// Name the template is registered under (its path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render with `data` as the context. `null` is a valid context.
    pub fn render(&self, data: &Value) -> TemplateResult<String> {
        let registry = self.registry.read().map_err(|e| TemplateError::Render {
            name: self.name.clone(),
            reason: e.to_string(),
        })?;
        registry
            .render(&self.name, data)
            .map_err(|e| TemplateError::Render {
                name: self.name.clone(),
                reason: e.to_string(),
            })
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").field("name", &self.name).finish()
    }
}

/// A partial being resolved: its source and the references not yet visited.
struct Frame {
    name: Option<String>,
    source: String,
    pending: Vec<String>,
}

impl Frame {
    fn new(name: Option<String>, source: String) -> Self {
        let mut pending = scan_partials(&source);
        pending.reverse();
        Self {
            name,
            source,
            pending,
        }
    }
}

/// Fetches, compiles and memoizes templates and partials.
pub struct TemplateEngine {
    scope: WorkerScope,
    cache: Arc<CacheManager>,
    network: Arc<dyn Network>,
    partial_dir: String,
    registry: Registry,
    compiled: RwLock<HashMap<String, Renderer>>,
    loaded_partials: RwLock<HashSet<String>>,
}

impl TemplateEngine {
    /// Create an engine. Partials are fetched from `<base_path><partial_dir>/<name>.html`.
    pub fn new(
        scope: WorkerScope,
        cache: Arc<CacheManager>,
        network: Arc<dyn Network>,
        partial_dir: impl Into<String>,
    ) -> Self {
        Self {
            scope,
            cache,
            network,
            partial_dir: partial_dir.into(),
            registry: Arc::new(RwLock::new(Handlebars::new())),
            compiled: RwLock::new(HashMap::new()),
            loaded_partials: RwLock::new(HashSet::new()),
        }
    }

    /// Get the compiled renderer for a template path, loading it on first use.
    pub async fn get_template(&self, path: &str) -> TemplateResult<Renderer> {
        if let Some(renderer) = self.memoized(path) {
            return Ok(renderer);
        }

        let source = self.template_source(path).await?;
        self.resolve_partials(source.clone()).await?;

        {
            let mut registry = self.registry.write().map_err(|e| compile_error(path, e))?;
            registry
                .register_template_string(path, &source)
                .map_err(|e| compile_error(path, e))?;
        }

        let renderer = Renderer {
            name: path.to_string(),
            registry: Arc::clone(&self.registry),
        };

        if let Ok(mut compiled) = self.compiled.write() {
            compiled.insert(path.to_string(), renderer.clone());
        }
        tracing::debug!(template = path, "template compiled");
        Ok(renderer)
    }

    /// Load a template and render it in one step.
    pub async fn render(&self, path: &str, data: &Value) -> TemplateResult<String> {
        self.get_template(path).await?.render(data)
    }

    /// Whether a compiled renderer is memoized for `path`.
    pub fn is_compiled(&self, path: &str) -> bool {
        self.memoized(path).is_some()
    }

    /// Whether a partial has been fetched and registered.
    pub fn is_partial_loaded(&self, name: &str) -> bool {
        self.loaded_partials
            .read()
            .map(|loaded| loaded.contains(name))
            .unwrap_or(false)
    }

    /// Path a partial is fetched from, relative to the base path.
    pub fn partial_path(&self, name: &str) -> String {
        format!("{}/{}.html", self.partial_dir.trim_end_matches('/'), name)
    }

    fn memoized(&self, path: &str) -> Option<Renderer> {
        self.compiled.read().ok()?.get(path).cloned()
    }

    /// Cache first, then network.
    async fn template_source(&self, path: &str) -> TemplateResult<String> {
        let cached = self
            .cache
            .match_path(path)
            .await
            .map_err(|e| fetch_error(path, e))?;

        match cached {
            Some(entry) => entry.text().map_err(|e| fetch_error(path, e)),
            None => self.fetch_text(path).await,
        }
    }

    async fn fetch_text(&self, path: &str) -> TemplateResult<String> {
        let url = self.scope.resolve(path).map_err(|e| fetch_error(path, e))?;
        let request = get_request(&url).map_err(|e| fetch_error(path, e))?;
        let response = self
            .network
            .fetch(request)
            .await
            .map_err(|e| fetch_error(path, e))?;

        if !response.status().is_success() {
            return Err(TemplateError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().map_err(|e| fetch_error(path, e))
    }

    /// Depth-first: a partial is registered only after every partial it
    /// references. A name met again while still on the chain is a cycle.
    async fn resolve_partials(&self, source: String) -> TemplateResult<()> {
        let mut stack = vec![Frame::new(None, source)];

        while let Some(top) = stack.last_mut() {
            let Some(name) = top.pending.pop() else {
                let Some(frame) = stack.pop() else { break };
                if let Some(name) = frame.name {
                    self.register_partial(&name, &frame.source)?;
                }
                continue;
            };

            if stack.iter().any(|f| f.name.as_deref() == Some(name.as_str())) {
                let mut chain: Vec<String> = stack.iter().filter_map(|f| f.name.clone()).collect();
                chain.push(name);
                return Err(TemplateError::PartialCycle { chain });
            }

            if self.is_partial_loaded(&name) {
                continue;
            }

            let source = self.fetch_text(&self.partial_path(&name)).await?;
            stack.push(Frame::new(Some(name), source));
        }

        Ok(())
    }

    fn register_partial(&self, name: &str, source: &str) -> TemplateResult<()> {
        {
            let mut registry = self.registry.write().map_err(|e| compile_error(name, e))?;
            registry
                .register_partial(name, source)
                .map_err(|e| compile_error(name, e))?;
        }
        if let Ok(mut loaded) = self.loaded_partials.write() {
            loaded.insert(name.to_string());
        }
        tracing::debug!(partial = name, "partial registered");
        Ok(())
    }
}

fn fetch_error(path: &str, e: impl std::fmt::Display) -> TemplateError {
    TemplateError::Fetch {
        path: path.to_string(),
        reason: e.to_string(),
    }
}

fn compile_error(name: &str, e: impl std::fmt::Display) -> TemplateError {
    TemplateError::Compile {
        name: name.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hx_cache::InMemoryCacheStorage;
    use hx_fetch::StaticNetwork;
    use serde_json::json;

    const BASE: &str = "https://example.com/app/";

    fn engine(network: &StaticNetwork) -> (TemplateEngine, Arc<CacheManager>) {
        let scope = WorkerScope::new("https://example.com", "/app/").unwrap();
        let cache = Arc::new(CacheManager::new(
            Arc::new(InMemoryCacheStorage::new()),
            Arc::new(network.clone()),
            scope.clone(),
            "cs-htmx",
        ));
        let engine = TemplateEngine::new(
            scope,
            Arc::clone(&cache),
            Arc::new(network.clone()),
            "templates",
        );
        (engine, cache)
    }

    fn url(path: &str) -> String {
        format!("{}{}", BASE, path)
    }

    #[tokio::test]
    async fn test_renders_rpc_result() {
        let network = StaticNetwork::new().with_body(
            &url("templates/task.html"),
            r#"<li id="{{id}}">{{task}}</li>"#,
        );
        let (engine, _) = engine(&network);

        let html = engine
            .render(
                "templates/task.html",
                &json!({ "id": "id-1", "task": "buy milk" }),
            )
            .await
            .unwrap();
        assert!(html.contains("buy milk"));
        assert!(html.contains(r#"id="id-1""#));
    }

    #[tokio::test]
    async fn test_null_context_renders() {
        let network = StaticNetwork::new().with_body(&url("templates/about.html"), "<p>About{{x}}</p>");
        let (engine, _) = engine(&network);

        let html = engine.render("templates/about.html", &Value::Null).await.unwrap();
        assert_eq!(html, "<p>About</p>");
    }

    #[tokio::test]
    async fn test_partial_fetched_once() {
        let network = StaticNetwork::new()
            .with_body(
                &url("templates/list.html"),
                "<ul>{{#each tasks}}{{> task-row}}{{/each}}</ul>{{> task-row}}",
            )
            .with_body(&url("templates/task-row.html"), "<li>{{task}}</li>");
        let (engine, _) = engine(&network);

        let html = engine
            .render(
                "templates/list.html",
                &json!({ "tasks": [{ "task": "a" }, { "task": "b" }], "task": "c" }),
            )
            .await
            .unwrap();

        assert_eq!(html, "<ul><li>a</li><li>b</li></ul><li>c</li>");
        assert_eq!(network.fetch_count(&url("templates/task-row.html")), 1);
        assert!(engine.is_partial_loaded("task-row"));
    }

    #[tokio::test]
    async fn test_partials_shared_across_templates() {
        let network = StaticNetwork::new()
            .with_body(&url("templates/a.html"), "A{{> footer}}")
            .with_body(&url("templates/b.html"), "B{{> footer}}")
            .with_body(&url("templates/footer.html"), "!");
        let (engine, _) = engine(&network);

        assert_eq!(engine.render("templates/a.html", &Value::Null).await.unwrap(), "A!");
        assert_eq!(engine.render("templates/b.html", &Value::Null).await.unwrap(), "B!");
        assert_eq!(network.fetch_count(&url("templates/footer.html")), 1);
    }

    #[tokio::test]
    async fn test_nested_partials_resolved_first() {
        let network = StaticNetwork::new()
            .with_body(&url("templates/page.html"), "[{{> outer}}]")
            .with_body(&url("templates/outer.html"), "<{{> inner}}>")
            .with_body(&url("templates/inner.html"), "{{name}}");
        let (engine, _) = engine(&network);

        let html = engine
            .render("templates/page.html", &json!({ "name": "x" }))
            .await
            .unwrap();
        assert_eq!(html, "[<x>]");
        assert!(engine.is_partial_loaded("inner"));
        assert!(engine.is_partial_loaded("outer"));
    }

    #[tokio::test]
    async fn test_cycle_fails_fast() {
        let network = StaticNetwork::new()
            .with_body(&url("templates/page.html"), "{{> a}}")
            .with_body(&url("templates/a.html"), "{{> b}}")
            .with_body(&url("templates/b.html"), "{{> a}}");
        let (engine, _) = engine(&network);

        let err = engine.get_template("templates/page.html").await.unwrap_err();
        match err {
            TemplateError::PartialCycle { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!engine.is_partial_loaded("a"));
        assert!(!engine.is_compiled("templates/page.html"));
        assert_eq!(network.fetch_count(&url("templates/a.html")), 1);
    }

    #[tokio::test]
    async fn test_template_memoized() {
        let network = StaticNetwork::new().with_body(&url("templates/t.html"), "{{v}}");
        let (engine, _) = engine(&network);

        engine.get_template("templates/t.html").await.unwrap();
        engine.get_template("templates/t.html").await.unwrap();
        assert!(engine.is_compiled("templates/t.html"));
        assert_eq!(network.fetch_count(&url("templates/t.html")), 1);
    }

    #[tokio::test]
    async fn test_source_read_from_cache_first() {
        let network = StaticNetwork::new().with_body(&url("templates/t.html"), "{{v}}");
        let (engine, cache) = engine(&network);
        cache.add("templates/t.html").await.unwrap();
        assert_eq!(network.total_fetches(), 1);

        let html = engine.render("templates/t.html", &json!({ "v": 1 })).await.unwrap();
        assert_eq!(html, "1");
        assert_eq!(network.total_fetches(), 1);
    }

    #[tokio::test]
    async fn test_missing_template() {
        let network = StaticNetwork::new().with_status(&url("templates/gone.html"), 404, "");
        let (engine, _) = engine(&network);

        let err = engine.get_template("templates/gone.html").await.unwrap_err();
        assert!(matches!(err, TemplateError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_compile_error() {
        let network = StaticNetwork::new().with_body(&url("templates/bad.html"), "{{#if}}");
        let (engine, _) = engine(&network);

        let err = engine.get_template("templates/bad.html").await.unwrap_err();
        assert!(matches!(err, TemplateError::Compile { .. }));
    }
}
