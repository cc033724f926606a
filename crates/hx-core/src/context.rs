//! Request context shared across the interception pipeline.

use std::sync::atomic::{AtomicU32, Ordering};

use http::HeaderMap;

/// Request type flowing through the worker.
pub type HttpRequest = http::Request<Vec<u8>>;

/// Response type synthesized or forwarded by the worker.
pub type HttpResponse = http::Response<Vec<u8>>;

/// Unique request identifier for log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);

        Self(format!("{:x}-{:x}", nanos, seq))
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an intercepted request is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Internal navigation/update resolved through the route table.
    Routed,
    /// Served from the cache, falling back to the network.
    PassThrough,
}

impl RequestKind {
    /// Classify a request by its routing flag header.
    ///
    /// Only the exact value `true` marks a request as routed.
    pub fn classify(headers: &HeaderMap, flag_header: &str) -> Self {
        match header_str(headers, flag_header) {
            Some("true") => Self::Routed,
            _ => Self::PassThrough,
        }
    }
}

/// Get a header value as a string (names are matched case-insensitively).
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
