//! RPC parameter gathering for routed requests.
//!
//! The parameter object is flat: form fields, then query parameters (a query
//! parameter replaces a form field of the same name). The reserved `_htmx` key
//! holds the request's `form`, `query`, `method` and marked `headers`
//! separately.

use http::header::CONTENT_TYPE;
use http::Method;
use hx_core::{header_str, HttpRequest};
use serde_json::{Map, Value};

use crate::error::InterceptError;

/// Key of the structured request summary.
pub const HTMX_KEY: &str = "_htmx";

/// Build the RPC parameter object for a routed request.
///
/// Headers are copied into `_htmx.headers` when their name starts with
/// `header_prefix` (case-insensitive).
pub fn gather_params(request: &HttpRequest, header_prefix: &str) -> Result<Value, InterceptError> {
    let mut params = Map::new();
    let mut form = Map::new();
    let mut query = Map::new();
    let mut headers = Map::new();

    if has_form_body(request.method()) {
        for (key, value) in decode_form(request)? {
            params.insert(key.clone(), Value::String(value.clone()));
            form.insert(key, Value::String(value));
        }
    }

    let prefix = header_prefix.to_ascii_lowercase();
    for (name, value) in request.headers() {
        if name.as_str().starts_with(&prefix) {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers.insert(name.as_str().to_string(), Value::String(value));
        }
    }

    if let Some(raw) = request.uri().query() {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)
            .map_err(|e| InterceptError::BadRequest(format!("invalid query string: {}", e)))?;
        for (key, value) in pairs {
            params.insert(key.clone(), Value::String(value.clone()));
            query.insert(key, Value::String(value));
        }
    }

    let mut htmx = Map::new();
    htmx.insert("form".to_string(), Value::Object(form));
    htmx.insert("query".to_string(), Value::Object(query));
    htmx.insert(
        "method".to_string(),
        Value::String(request.method().as_str().to_string()),
    );
    htmx.insert("headers".to_string(), Value::Object(headers));
    params.insert(HTMX_KEY.to_string(), Value::Object(htmx));

    Ok(Value::Object(params))
}

fn has_form_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT
}

fn decode_form(request: &HttpRequest) -> Result<Vec<(String, String)>, InterceptError> {
    let content_type = header_str(request.headers(), CONTENT_TYPE.as_str()).unwrap_or_default();
    if content_type.starts_with("multipart/") {
        return Err(InterceptError::BadRequest(
            "multipart form bodies are not supported".to_string(),
        ));
    }

    serde_urlencoded::from_bytes(request.body())
        .map_err(|e| InterceptError::BadRequest(format!("invalid form body: {}", e)))
}
