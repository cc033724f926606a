//! Cached response entries.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hx_core::HttpResponse;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

/// A response as stored in a cache generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in arrival order.
    pub headers: Vec<(String, String)>,
    /// Base64-encoded body.
    body: String,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

impl StoredResponse {
    /// Create an entry from a status and raw body.
    pub fn new(status: u16, body: &[u8]) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: STANDARD.encode(body),
            stored_at: Utc::now(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Snapshot a response for storage. Headers that are not valid strings are dropped.
    pub fn from_response(response: &HttpResponse) -> Self {
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            status: response.status().as_u16(),
            headers,
            body: STANDARD.encode(response.body()),
            stored_at: Utc::now(),
        }
    }

    /// Decoded body bytes.
    pub fn body(&self) -> CacheResult<Vec<u8>> {
        STANDARD
            .decode(&self.body)
            .map_err(|e| CacheError::Serialization(e.to_string()))
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> CacheResult<String> {
        String::from_utf8(self.body()?).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    /// Rebuild an HTTP response from this entry.
    pub fn to_response(&self) -> CacheResult<HttpResponse> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(self.body()?)
            .map_err(|e| CacheError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_keeps_status_headers_body() {
        let response = http::Response::builder()
            .status(200)
            .header("content-type", "text/css")
            .body(b"body{}".to_vec())
            .unwrap();

        let stored = StoredResponse::from_response(&response);
        assert_eq!(stored.status, 200);
        assert_eq!(
            stored.headers,
            vec![("content-type".to_string(), "text/css".to_string())]
        );
        assert_eq!(stored.text().unwrap(), "body{}");

        let rebuilt = stored.to_response().unwrap();
        assert_eq!(rebuilt.headers()["content-type"], "text/css");
        assert_eq!(rebuilt.body(), b"body{}");
    }

    #[test]
    fn test_binary_body_survives_json() {
        let stored = StoredResponse::new(200, &[0, 159, 146, 150]);
        let json = serde_json::to_string(&stored).unwrap();
        let back: StoredResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.body().unwrap(), vec![0, 159, 146, 150]);
    }
}
