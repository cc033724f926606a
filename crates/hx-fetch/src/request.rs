//! HTTP request builder.

use http::{HeaderName, HeaderValue, Method};
use hx_core::HttpRequest;
use serde::Serialize;

use crate::FetchError;

/// A builder for constructing outbound requests.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<Vec<u8>>,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header, replacing any earlier value with the same name.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
        self.headers.push((key, value.into()));
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, FetchError> {
        let json = serde_json::to_vec(value)?;
        self = self.content_type("application/json");
        self.body = Some(json);
        Ok(self)
    }

    /// Set the Content-Type header.
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header("Content-Type", content_type)
    }

    /// Build the request.
    pub fn build(self) -> Result<HttpRequest, FetchError> {
        let url = url::Url::parse(&self.url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let mut request = http::Request::builder()
            .method(self.method)
            .uri(url.as_str())
            .body(self.body.unwrap_or_default())?;

        for (key, value) in self.headers {
            let name = HeaderName::try_from(key.as_str())
                .map_err(|e| FetchError::RequestError(e.to_string()))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| FetchError::RequestError(e.to_string()))?;
            request.headers_mut().insert(name, value);
        }

        Ok(request)
    }
}

/// Build a bare GET request for a URL.
pub fn get_request(url: &url::Url) -> Result<HttpRequest, FetchError> {
    RequestBuilder::new(Method::GET, url.as_str()).build()
}
