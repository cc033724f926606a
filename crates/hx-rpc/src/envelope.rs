//! Wire envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version sent with every request.
pub const JSONRPC_VERSION: &str = "1.1";

/// Request envelope: `{ method, params, id, jsonrpc }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
    pub jsonrpc: String,
}

impl RpcRequest {
    /// Build a request carrying a single parameter object.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params: vec![params],
            id: 1,
            jsonrpc: JSONRPC_VERSION.to_string(),
        }
    }
}

/// The `error` member of a response.
///
/// Backends send either `{ "message": ... }` or a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcErrorPayload {
    Message(String),
    Object {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<i64>,
    },
    Other(Value),
}

impl RpcErrorPayload {
    /// Build the object form.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Object {
            message: message.into(),
            code: None,
        }
    }

    /// Human readable message.
    pub fn message(&self) -> String {
        match self {
            Self::Message(message) | Self::Object { message, .. } => message.clone(),
            Self::Other(value) => value.to_string(),
        }
    }
}

/// Response envelope: `{ result }` or `{ error }`.
///
/// A missing `result` reads as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl RpcResponse {
    /// A success envelope. `null` is serialised explicitly.
    pub fn success(result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::default()
        }
    }

    /// A failure envelope with an error message object.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(RpcErrorPayload::new(message)),
            ..Self::default()
        }
    }

    /// Echo the request id.
    pub fn with_id(mut self, id: Option<Value>) -> Self {
        self.id = id;
        self
    }

    /// The result, or the error message.
    pub fn into_result(self) -> Result<Value, String> {
        match self.error {
            Some(error) => Err(error.message()),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let request = RpcRequest::new("todoAdd", json!({ "task": "buy milk" }));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "method": "todoAdd",
                "params": [{ "task": "buy milk" }],
                "id": 1,
                "jsonrpc": "1.1"
            })
        );
    }

    #[test]
    fn test_error_shapes() {
        let object: RpcResponse =
            serde_json::from_str(r#"{"error": {"message": "Method not found", "code": -32601}}"#)
                .unwrap();
        assert_eq!(object.into_result(), Err("Method not found".to_string()));

        let bare: RpcResponse = serde_json::from_str(r#"{"error": "Route not found"}"#).unwrap();
        assert_eq!(bare.into_result(), Err("Route not found".to_string()));

        let odd: RpcResponse = serde_json::from_str(r#"{"error": 42}"#).unwrap();
        assert_eq!(odd.into_result(), Err("42".to_string()));
    }

    #[test]
    fn test_null_and_missing_result() {
        let null: RpcResponse = serde_json::from_str(r#"{"result": null}"#).unwrap();
        assert_eq!(null.into_result(), Ok(Value::Null));

        let missing: RpcResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.into_result(), Ok(Value::Null));

        let null_error: RpcResponse =
            serde_json::from_str(r#"{"result": 1, "error": null}"#).unwrap();
        assert_eq!(null_error.into_result(), Ok(json!(1)));
    }

    #[test]
    fn test_success_serialises_null() {
        let response = RpcResponse::success(Value::Null);
        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"result":null}"#);
    }
}
