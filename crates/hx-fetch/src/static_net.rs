//! In-memory network for development and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hx_core::{HttpRequest, HttpResponse};

use crate::{FetchError, Network};

type Handler = Arc<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// A network that answers from a fixed table of URLs.
///
/// Every fetch is recorded, so callers can assert how often a URL was hit and
/// what was sent to it. Unknown URLs fail like an unreachable host.
#[derive(Default, Clone)]
pub struct StaticNetwork {
    handlers: Arc<Mutex<HashMap<String, Handler>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl StaticNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a fixed `200 OK` body for a URL.
    pub fn with_body(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        self.with_handler(url, move |_| ok_response(body.clone()))
    }

    /// Serve a fixed status and body for a URL.
    pub fn with_status(self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        self.with_handler(url, move |_| {
            let mut response = ok_response(body.clone());
            *response.status_mut() =
                http::StatusCode::from_u16(status).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
            response
        })
    }

    /// Answer a URL with a handler computed per request.
    pub fn with_handler<F>(self, url: &str, handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.insert(url.to_string(), Arc::new(handler));
        }
        self
    }

    /// Number of fetches made for a URL.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .map(|requests| requests.iter().filter(|r| r.uri() == url).count())
            .unwrap_or(0)
    }

    /// Total number of fetches made.
    pub fn total_fetches(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Requests sent to a URL, oldest first.
    pub fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|requests| {
                requests
                    .iter()
                    .filter(|r| r.uri() == url)
                    .map(clone_request)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Network for StaticNetwork {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = request.uri().to_string();

        let handler = self
            .handlers
            .lock()
            .map_err(|e| FetchError::RequestError(e.to_string()))?
            .get(&url)
            .cloned();

        let response = handler.map(|h| h(&request));

        self.requests
            .lock()
            .map_err(|e| FetchError::RequestError(e.to_string()))?
            .push(request);

        response.ok_or(FetchError::Unreachable(url))
    }
}

fn ok_response(body: Vec<u8>) -> HttpResponse {
    let mut response = http::Response::new(body);
    *response.status_mut() = http::StatusCode::OK;
    response
}

fn clone_request(request: &HttpRequest) -> HttpRequest {
    let mut clone = http::Request::new(request.body().clone());
    *clone.method_mut() = request.method().clone();
    *clone.uri_mut() = request.uri().clone();
    *clone.headers_mut() = request.headers().clone();
    clone
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestBuilder;
    use crate::ResponseExt;

    fn get(url: &str) -> HttpRequest {
        RequestBuilder::new(http::Method::GET, url).build().unwrap()
    }

    #[tokio::test]
    async fn test_serves_body_and_counts() {
        let network = StaticNetwork::new().with_body("https://example.com/a", "alpha");

        let response = network.fetch(get("https://example.com/a")).await.unwrap();
        assert_eq!(response.text().unwrap(), "alpha");

        network.fetch(get("https://example.com/a")).await.unwrap();
        assert_eq!(network.fetch_count("https://example.com/a"), 2);
        assert_eq!(network.total_fetches(), 2);
    }

    #[tokio::test]
    async fn test_unknown_url_is_unreachable() {
        let network = StaticNetwork::new();
        let result = network.fetch(get("https://example.com/missing")).await;
        assert!(matches!(result, Err(FetchError::Unreachable(_))));
        assert_eq!(network.fetch_count("https://example.com/missing"), 1);
    }

    #[tokio::test]
    async fn test_status_override() {
        let network = StaticNetwork::new().with_status("https://example.com/gone", 410, "");
        let response = network.fetch(get("https://example.com/gone")).await.unwrap();
        assert_eq!(response.status().as_u16(), 410);
    }

    #[tokio::test]
    async fn test_records_request_bodies() {
        let network = StaticNetwork::new().with_handler("https://example.com/echo", |req| {
            http::Response::new(req.body().clone())
        });
        let request = RequestBuilder::new(http::Method::POST, "https://example.com/echo")
            .json(&"ping")
            .unwrap()
            .build()
            .unwrap();

        let response = network.fetch(request).await.unwrap();
        assert_eq!(response.body(), br#""ping""#);
        assert_eq!(network.requests_to("https://example.com/echo")[0].body(), br#""ping""#);
    }
}
