//! The network seam: how the worker reaches the outside world.

use async_trait::async_trait;
use hx_core::{HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;

use crate::FetchError;

/// Platform network access.
///
/// Mirrors a plain `fetch`: any HTTP status is a successful fetch, only
/// transport failures are errors.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Network: Send + Sync {
    /// Send a request and return the response verbatim.
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Convenience accessors on responses.
pub trait ResponseExt {
    /// Check if the response was successful (2xx status).
    fn is_success(&self) -> bool;

    /// Get the response body as text.
    fn text(&self) -> Result<String, FetchError>;

    /// Parse the response body as JSON.
    fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError>;

    /// Convert to a Result, returning an error for non-2xx status codes.
    fn error_for_status(self) -> Result<HttpResponse, FetchError>;
}

impl ResponseExt for HttpResponse {
    fn is_success(&self) -> bool {
        self.status().is_success()
    }

    fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body().clone())
            .map_err(|e| FetchError::ParseError(format!("Invalid UTF-8: {}", e)))
    }

    fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(self.body()).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    fn error_for_status(self) -> Result<HttpResponse, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            let message = self
                .status()
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string();
            Err(FetchError::HttpError {
                status: self.status().as_u16(),
                message,
            })
        }
    }
}
