//! Network backed by Spin outbound HTTP.

use async_trait::async_trait;
use hx_core::{HttpRequest, HttpResponse};
use spin_sdk::http::{Method as SpinMethod, Request, Response};

use crate::{FetchError, Network};

/// Outbound HTTP through the Spin host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinNetwork;

impl SpinNetwork {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl Network for SpinNetwork {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let (parts, body) = request.into_parts();

        let method = match parts.method {
            http::Method::GET => SpinMethod::Get,
            http::Method::POST => SpinMethod::Post,
            http::Method::PUT => SpinMethod::Put,
            http::Method::PATCH => SpinMethod::Patch,
            http::Method::DELETE => SpinMethod::Delete,
            http::Method::HEAD => SpinMethod::Head,
            http::Method::OPTIONS => SpinMethod::Options,
            other => return Err(FetchError::RequestError(format!("unsupported method {}", other))),
        };

        let mut builder = Request::builder();
        builder.method(method);
        builder.uri(parts.uri.to_string());
        for (name, value) in parts.headers.iter() {
            if let Ok(value) = value.to_str() {
                builder.header(name.as_str(), value);
            }
        }
        let outbound = builder.body(body).build();

        let response: Response = spin_sdk::http::send(outbound)
            .await
            .map_err(|e| FetchError::RequestError(e.to_string()))?;

        let mut out = http::Response::builder().status(*response.status());
        for (name, value) in response.headers() {
            if let Some(value) = value.as_str() {
                out = out.header(name, value);
            }
        }

        Ok(out.body(response.into_body())?)
    }
}
