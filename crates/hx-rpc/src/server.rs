//! Backend-side method dispatch.
//!
//! Methods are resolved through the route manifest the worker uses, then
//! handed to a handler registered at startup. There is no lookup of code by
//! name at runtime.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use hx_router::RouteManifest;
use serde::Serialize;
use serde_json::Value;

use crate::envelope::RpcResponse;

type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Failure message for a body that is not a request envelope.
pub const INVALID_REQUEST: &str = "Invalid request";
/// Failure message for a method no route names.
pub const ROUTE_NOT_FOUND: &str = "Route not found";
/// Failure message for a routed method without a handler.
pub const METHOD_NOT_FOUND: &str = "Method not found";

/// Maps method names to handlers.
#[derive(Clone, Default)]
pub struct RpcDispatcher {
    /// Method name to the RPC path of the first route naming it.
    routes: HashMap<String, String>,
    handlers: HashMap<String, Handler>,
}

impl RpcDispatcher {
    /// Create a dispatcher that knows the methods named by `manifest`.
    pub fn from_manifest(manifest: &RouteManifest) -> Self {
        let mut dispatcher = Self::default();
        for (_, spec) in manifest.specs() {
            if let (Some(function), Some(path)) = (spec.rpc_function, spec.rpc_path) {
                dispatcher.routes.entry(function).or_insert(path);
            }
        }
        dispatcher
    }

    /// Register the handler for `method`.
    ///
    /// The handler receives the call's parameter object. Whatever it returns
    /// is serialised as the result; `()` becomes `null`.
    pub fn register<F, Fut, R>(&mut self, method: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let handler = Arc::new(handler);
        let boxed: Handler = Arc::new(move |params| {
            let handler = Arc::clone(&handler);
            async move {
                let value = handler(params).await?;
                Ok(serde_json::to_value(value)?)
            }
            .boxed()
        });
        self.handlers.insert(method.into(), boxed);
        self
    }

    /// RPC path of the route naming `method`.
    pub fn route_for(&self, method: &str) -> Option<&str> {
        self.routes.get(method).map(String::as_str)
    }

    /// Methods named by the manifest, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    /// Handle one raw request body. Always produces a response envelope.
    pub async fn dispatch(&self, body: &[u8]) -> RpcResponse {
        let request: Value = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, "invalid RPC request body");
                return RpcResponse::failure(INVALID_REQUEST);
            }
        };

        let id = request.get("id").cloned();
        let (method, params) = match (
            request.get("method").and_then(Value::as_str),
            request.get("params").filter(|p| !p.is_null()),
        ) {
            (Some(method), Some(params)) => (method.to_string(), params.clone()),
            _ => {
                tracing::error!(request = %request, "invalid RPC request");
                return RpcResponse::failure(INVALID_REQUEST).with_id(id);
            }
        };

        tracing::info!(method = %method, params = %params, "RPC request received");

        let Some(path) = self.route_for(&method) else {
            tracing::error!(method = %method, "route not found for method");
            return RpcResponse::failure(ROUTE_NOT_FOUND).with_id(id);
        };
        tracing::info!(method = %method, rpc_path = path, "route matched");

        let Some(handler) = self.handlers.get(&method) else {
            tracing::error!(method = %method, "method not found");
            return RpcResponse::failure(METHOD_NOT_FOUND).with_id(id);
        };

        let outcome = AssertUnwindSafe(handler(call_params(params)))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => {
                tracing::info!(method = %method, result = %result, "RPC call succeeded");
                RpcResponse::success(result).with_id(id)
            }
            Ok(Err(e)) => {
                tracing::error!(method = %method, error = %e, "RPC handler failed");
                RpcResponse::failure(e.to_string()).with_id(id)
            }
            Err(_) => {
                tracing::error!(method = %method, "RPC handler panicked");
                RpcResponse::failure(format!("{method} panicked")).with_id(id)
            }
        }
    }

    /// Handle one raw request body and serialise the response.
    pub async fn dispatch_bytes(&self, body: &[u8]) -> Vec<u8> {
        let response = self.dispatch(body).await;
        serde_json::to_vec(&response).unwrap_or_else(|_| br#"{"error":"Internal error"}"#.to_vec())
    }
}

/// Clients send `[params]`; handlers see the single object.
fn call_params(params: Value) -> Value {
    match params {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    }
}
