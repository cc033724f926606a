//! RPC client.

use std::sync::Arc;

use hx_core::WorkerScope;
use hx_fetch::{FetchClient, Network, ResponseExt};
use serde_json::Value;

use crate::envelope::{RpcRequest, RpcResponse};
use crate::error::RpcError;

/// Calls remote procedures over a [`Network`].
#[derive(Clone)]
pub struct RpcClient {
    scope: WorkerScope,
    http: FetchClient,
}

impl RpcClient {
    /// Create a client resolving RPC paths against `scope`.
    pub fn new(scope: WorkerScope, network: Arc<dyn Network>) -> Self {
        Self {
            scope,
            http: FetchClient::new(network),
        }
    }

    /// Invoke `method` at `rpc_path` with a single parameter object.
    ///
    /// Resolves with the response's `result`, which may be `null`.
    pub async fn invoke(&self, rpc_path: &str, method: &str, params: Value) -> Result<Value, RpcError> {
        let url = self
            .scope
            .resolve(rpc_path)
            .map_err(|e| RpcError::Transport {
                url: rpc_path.to_string(),
                reason: e.to_string(),
            })?;

        let result = self.call(url.as_str(), RpcRequest::new(method, params)).await;
        if let Err(e) = &result {
            tracing::error!(rpc_path, method, error = %e, "RPC call failed");
        }
        result
    }

    async fn call(&self, url: &str, request: RpcRequest) -> Result<Value, RpcError> {
        let response = self
            .http
            .post(url)
            .header("Accept", "application/json")
            .json(&request)
            .map_err(|e| RpcError::Encode(e.to_string()))?
            .send()
            .await
            .map_err(|e| RpcError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let envelope: RpcResponse = response
            .error_for_status()
            .map_err(|e| RpcError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?
            .json()
            .map_err(|e| RpcError::Decode(e.to_string()))?;

        envelope.into_result().map_err(|message| RpcError::Protocol {
            method: request.method,
            message,
        })
    }
}
