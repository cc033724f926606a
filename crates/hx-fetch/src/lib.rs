//! Network seam and HTTP client utilities for the hx edge request router.
//!
//! The worker never talks to a concrete HTTP stack directly. Everything goes
//! through the [`Network`] trait, which has three implementations:
//! - `ReqwestNetwork` on native targets
//! - `SpinNetwork` on `wasm32` (Spin outbound HTTP)
//! - `StaticNetwork` for development and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hx_fetch::{FetchClient, ReqwestNetwork, ResponseExt};
//!
//! let client = FetchClient::new(Arc::new(ReqwestNetwork::new()));
//!
//! let response = client
//!     .post("https://api.example.com/todo.php")
//!     .json(&envelope)?
//!     .send()
//!     .await?;
//! let body: serde_json::Value = response.json()?;
//! ```

use std::sync::Arc;

use http::Method;
use hx_core::HttpResponse;

mod error;
mod network;
mod request;
mod static_net;

#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(target_arch = "wasm32")]
mod spin;

pub use error::FetchError;
pub use network::{Network, ResponseExt};
pub use request::{get_request, RequestBuilder};
pub use static_net::StaticNetwork;

#[cfg(not(target_arch = "wasm32"))]
pub use native::ReqwestNetwork;
#[cfg(target_arch = "wasm32")]
pub use spin::SpinNetwork;

/// HTTP client for making outbound requests over a [`Network`].
#[derive(Clone)]
pub struct FetchClient {
    network: Arc<dyn Network>,
}

impl FetchClient {
    /// Create a new HTTP client.
    pub fn new(network: Arc<dyn Network>) -> Self {
        Self { network }
    }

    /// Create a POST request.
    pub fn post(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::POST, url)
    }

    /// Create a request with a custom method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> ClientRequestBuilder {
        ClientRequestBuilder {
            network: Arc::clone(&self.network),
            builder: RequestBuilder::new(method, url),
        }
    }
}

/// A request builder bound to a client.
pub struct ClientRequestBuilder {
    network: Arc<dyn Network>,
    builder: RequestBuilder,
}

impl ClientRequestBuilder {
    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, FetchError> {
        self.builder = self.builder.json(value)?;
        Ok(self)
    }

    /// Send the request and return the response, whatever its status.
    pub async fn send(self) -> Result<HttpResponse, FetchError> {
        let request = self.builder.build()?;
        self.network.fetch(request).await
    }
}
