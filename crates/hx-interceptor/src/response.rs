//! Synthesized responses.

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use hx_core::HttpResponse;

use crate::error::InterceptError;

/// Body of a routed 404.
pub const NOT_FOUND_BODY: &str = "Not Found";
/// Body of a routed 500.
pub const ERROR_BODY: &str = "Error handling request";

/// `200 OK` carrying rendered markup.
pub fn html_response(html: String) -> HttpResponse {
    let mut response = HttpResponse::new(html.into_bytes());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
    response
}

/// `200 OK` with no body.
pub fn empty_response() -> HttpResponse {
    HttpResponse::new(Vec::new())
}

/// The response a routed request gets for an error.
pub fn error_response(error: &InterceptError) -> HttpResponse {
    let (status, body) = match error.status() {
        404 => (StatusCode::NOT_FOUND, NOT_FOUND_BODY),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, ERROR_BODY),
    };

    let mut response = HttpResponse::new(body.as_bytes().to_vec());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}
