//! RPC error types.

use thiserror::Error;

/// Errors returned by [`crate::RpcClient::invoke`].
#[derive(Error, Debug)]
pub enum RpcError {
    /// The call never produced a success status.
    #[error("RPC transport error calling {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The backend answered with an `error` field.
    #[error("RPC call {method} failed: {message}")]
    Protocol { method: String, message: String },

    /// The response body is not a response envelope.
    #[error("invalid RPC response: {0}")]
    Decode(String),

    #[error("failed to encode RPC request: {0}")]
    Encode(String),
}

impl RpcError {
    /// Whether the backend itself reported the failure.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}
