//! Spin component hosting the hx request interceptor.
//!
//! The Spin host has no install or activate events and may create a fresh
//! instance for every request. Each request therefore:
//! 1. builds an interceptor and loads the route manifest
//! 2. resumes the cache generation if it is marked ready, otherwise installs
//!    and activates it
//! 3. hands the request, re-addressed to the upstream origin, to the interceptor
//!
//! An instance whose generation could not be installed stays inactive and
//! forwards every request to the upstream unrouted.
//!
//! Configuration is embedded from `hx.toml`.

use std::sync::Arc;

use http::{StatusCode, Uri};
use hx_cache::CacheStorage;
use hx_core::{ConfigError, HttpRequest, HttpResponse, WorkerConfig};
use hx_fetch::Network;
use hx_interceptor::{InterceptError, Interceptor};

/// Deployment configuration compiled into the component.
pub const EMBEDDED_CONFIG: &str = include_str!("../hx.toml");

/// Parse and validate the embedded configuration.
pub fn embedded_config() -> Result<WorkerConfig, ConfigError> {
    let config = WorkerConfig::from_toml_str(EMBEDDED_CONFIG)?;
    config.validate()?;
    Ok(config)
}

/// Resume the current generation, or run install then activate if it is not
/// marked ready.
///
/// Returns whether the lifecycle ran.
pub async fn ensure_ready(interceptor: &Interceptor) -> Result<bool, InterceptError> {
    if interceptor.resume().await? {
        return Ok(false);
    }

    interceptor.on_install().await?;
    interceptor.on_activate().await?;
    Ok(true)
}

/// Rewrite a request's URI onto the configured origin, keeping path and query.
pub fn to_upstream(request: HttpRequest, config: &WorkerConfig) -> Result<HttpRequest, InterceptError> {
    let scope = config.scope()?;
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or("/");

    let uri: Uri = format!("{}{}", scope.base_url().origin().ascii_serialization(), path)
        .parse()
        .map_err(|e| InterceptError::BadRequest(format!("invalid request URI: {}", e)))?;

    let (mut parts, body) = request.into_parts();
    parts.uri = uri;
    Ok(http::Request::from_parts(parts, body))
}

/// Handle one request from start to finish.
///
/// A failed install is logged and the request is forwarded to the upstream
/// unchanged, without routing or cache lookups.
pub async fn handle_request(
    config: WorkerConfig,
    network: Arc<dyn Network>,
    storage: Arc<dyn CacheStorage>,
    request: HttpRequest,
) -> HttpResponse {
    let request = match to_upstream(request, &config) {
        Ok(request) => request,
        Err(e) => return plain_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let interceptor = match Interceptor::bootstrap(config, network, storage).await {
        Ok(interceptor) => interceptor,
        Err(e) => {
            tracing::error!(error = %e, "failed to start interceptor");
            return plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Error handling request");
        }
    };

    match ensure_ready(&interceptor).await {
        Ok(true) => tracing::info!(
            generation = interceptor.cache().current_generation(),
            "cache generation installed and activated"
        ),
        Ok(false) => {}
        Err(e) => tracing::error!(error = %e, "cache lifecycle failed, forwarding unrouted"),
    }

    match interceptor.on_fetch(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "upstream fetch failed");
            plain_response(StatusCode::BAD_GATEWAY, "Bad Gateway")
        }
    }
}

fn plain_response(status: StatusCode, body: &str) -> HttpResponse {
    let mut response = HttpResponse::new(body.as_bytes().to_vec());
    *response.status_mut() = status;
    response
}

#[cfg(target_arch = "wasm32")]
mod component {
    use std::sync::Arc;

    use anyhow::anyhow;
    use hx_cache::SpinKvCacheStorage;
    use hx_core::HttpRequest;
    use hx_fetch::SpinNetwork;
    use hx_observability::{init_tracing, LogLevel};
    use spin_sdk::http::{Method as SpinMethod, Request, Response};
    use spin_sdk::http_component;

    /// Main HTTP handler.
    #[http_component]
    async fn handle(req: Request) -> anyhow::Result<Response> {
        init_tracing(LogLevel::Info);

        let config = crate::embedded_config()?;
        let storage = SpinKvCacheStorage::open_default()?;
        let request = from_spin(req)?;

        let response = crate::handle_request(
            config,
            Arc::new(SpinNetwork::new()),
            Arc::new(storage),
            request,
        )
        .await;

        Ok(to_spin(response))
    }

    fn from_spin(req: Request) -> anyhow::Result<HttpRequest> {
        let method = match req.method() {
            SpinMethod::Get => http::Method::GET,
            SpinMethod::Post => http::Method::POST,
            SpinMethod::Put => http::Method::PUT,
            SpinMethod::Patch => http::Method::PATCH,
            SpinMethod::Delete => http::Method::DELETE,
            SpinMethod::Head => http::Method::HEAD,
            SpinMethod::Options => http::Method::OPTIONS,
            other => return Err(anyhow!("unsupported method {:?}", other)),
        };

        let mut builder = http::Request::builder().method(method).uri(req.uri());
        for (name, value) in req.headers() {
            if let Some(value) = value.as_str() {
                builder = builder.header(name, value);
            }
        }

        Ok(builder.body(req.into_body())?)
    }

    fn to_spin(response: hx_core::HttpResponse) -> Response {
        let (parts, body) = response.into_parts();

        let mut builder = Response::builder();
        builder.status(parts.status.as_u16());
        for (name, value) in parts.headers.iter() {
            if let Ok(value) = value.to_str() {
                builder.header(name.as_str(), value);
            }
        }
        builder.body(body).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hx_cache::{InMemoryCacheStorage, READY_MARKER};
    use hx_fetch::StaticNetwork;

    const UPSTREAM: &str = "http://127.0.0.1:8080";

    fn upstream() -> StaticNetwork {
        StaticNetwork::new()
            .with_body(
                &format!("{UPSTREAM}/routes.json"),
                r#"{"about": {"template": "about.html"}}"#,
            )
            .with_body(&format!("{UPSTREAM}/index.html"), "<html></html>")
            .with_body(&format!("{UPSTREAM}/styles.css"), "body{}")
            .with_body(&format!("{UPSTREAM}/templates/about.html"), "<p>about</p>")
    }

    fn incoming(path: &str, routed: bool) -> HttpRequest {
        let mut builder = http::Request::builder().uri(format!("http://edge.example{path}"));
        if routed {
            builder = builder.header("HX-Request", "true");
        }
        builder.body(Vec::new()).unwrap()
    }

    #[test]
    fn test_embedded_config() {
        let config = embedded_config().unwrap();
        assert_eq!(config.origin, UPSTREAM);
        assert_eq!(config.cache_name, "cs-htmx");
    }

    #[test]
    fn test_to_upstream_keeps_path_and_query() {
        let config = embedded_config().unwrap();
        let request = to_upstream(incoming("/tasks?x=1", false), &config).unwrap();
        assert_eq!(request.uri(), "http://127.0.0.1:8080/tasks?x=1");
    }

    #[tokio::test]
    async fn test_first_request_installs_once() {
        let network = upstream();
        let storage = InMemoryCacheStorage::new();
        let config = embedded_config().unwrap();

        for _ in 0..2 {
            let response = handle_request(
                config.clone(),
                Arc::new(network.clone()),
                Arc::new(storage.clone()),
                incoming("/index.html", false),
            )
            .await;
            assert_eq!(response.body(), b"<html></html>");
        }

        // Fetched by the install only; later requests are served from the cache.
        assert_eq!(network.fetch_count(&format!("{UPSTREAM}/index.html")), 1);
        assert_eq!(storage.generations().await.unwrap(), vec!["cs-htmx"]);
    }

    #[tokio::test]
    async fn test_ready_instances_do_not_refetch_templates() {
        let network = upstream();
        let storage = InMemoryCacheStorage::new();
        let config = embedded_config().unwrap();
        let template = format!("{UPSTREAM}/templates/about.html");

        let mut counts = Vec::new();
        for _ in 0..5 {
            handle_request(
                config.clone(),
                Arc::new(network.clone()),
                Arc::new(storage.clone()),
                incoming("/index.html", false),
            )
            .await;
            counts.push(network.fetch_count(&template));
        }

        // Only the first instance primes and installs.
        assert!(counts[0] > 0);
        assert!(counts.iter().all(|count| *count == counts[0]));
    }

    #[tokio::test]
    async fn test_failed_install_forwards_unrouted() {
        let network = upstream()
            .with_status(&format!("{UPSTREAM}/styles.css"), 404, "")
            .with_body(&format!("{UPSTREAM}/about"), "upstream about");
        let storage = InMemoryCacheStorage::new();

        let response = handle_request(
            embedded_config().unwrap(),
            Arc::new(network.clone()),
            Arc::new(storage.clone()),
            incoming("/about", true),
        )
        .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), b"upstream about");
        assert_eq!(network.fetch_count(&format!("{UPSTREAM}/about")), 1);
        let cached = storage.urls("cs-htmx").await.unwrap();
        assert!(!cached.iter().any(|url| url == READY_MARKER));
    }

    #[tokio::test]
    async fn test_routed_request() {
        let network = upstream();
        let response = handle_request(
            embedded_config().unwrap(),
            Arc::new(network),
            Arc::new(InMemoryCacheStorage::new()),
            incoming("/about", true),
        )
        .await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), b"<p>about</p>");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let network = upstream();
        let response = handle_request(
            embedded_config().unwrap(),
            Arc::new(network),
            Arc::new(InMemoryCacheStorage::new()),
            incoming("/missing.js", false),
        )
        .await;
        assert_eq!(response.status(), 502);
    }
}
