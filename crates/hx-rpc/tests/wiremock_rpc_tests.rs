//! RPC client tests against a mock HTTP backend.

use std::sync::Arc;

use hx_core::WorkerScope;
use hx_fetch::ReqwestNetwork;
use hx_rpc::{RpcClient, RpcError};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> RpcClient {
    let scope = WorkerScope::new(&server.uri(), "/app/").unwrap();
    RpcClient::new(scope, Arc::new(ReqwestNetwork::new()))
}

/// The envelope is posted as JSON to the path relative to the base path.
#[tokio::test]
async fn test_invoke_sends_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/app/api/todo.php"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "method": "todoAdd",
            "params": [{ "task": "buy milk" }],
            "id": 1,
            "jsonrpc": "1.1"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "result": { "id": "id-1", "task": "buy milk" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .invoke("api/todo.php", "todoAdd", json!({ "task": "buy milk" }))
        .await;

    assert_eq!(result.unwrap(), json!({ "id": "id-1", "task": "buy milk" }));
}

/// `null` is a meaningful result.
#[tokio::test]
async fn test_null_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/app/api/todo.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result":null}"#))
        .mount(&server)
        .await;

    let result = client(&server)
        .invoke("api/todo.php", "todoDelete", json!({ "id": "id-1" }))
        .await;

    assert_eq!(result.unwrap(), Value::Null);
}

/// A bare-string error from the backend is a protocol error.
#[tokio::test]
async fn test_backend_error_string() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"error":"Route not found"}"#))
        .mount(&server)
        .await;

    let err = client(&server)
        .invoke("api/todo.php", "nope", json!({}))
        .await
        .unwrap_err();

    assert!(err.is_protocol());
    assert!(err.to_string().contains("Route not found"));
}

/// Non-success statuses never reach envelope decoding.
#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "result": 1 })))
        .mount(&server)
        .await;

    let err = client(&server)
        .invoke("api/todo.php", "todoList", json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, RpcError::Transport { .. }), "got {err:?}");
}

/// An unreachable backend is a transport error.
#[tokio::test]
async fn test_unreachable_backend() {
    let server = MockServer::start().await;
    let client = client(&server);
    drop(server);

    let err = client
        .invoke("api/todo.php", "todoList", json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, RpcError::Transport { .. }), "got {err:?}");
}
