use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use dynamo_gateway::{
    api::{create_router, ApiState},
    mock::{MockHandle, MockProvider},
    registry::ActionRegistry,
    Action, ActionDispatcher, Context, ExecutionFacade, FailureClass, GatewayConfig,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(handle: MockHandle) -> Router {
    let facade = ExecutionFacade::new(Arc::new(MockProvider::new(handle)), ActionDispatcher::default());
    let state = ApiState::with_plugin(
        Arc::new(Context::new(GatewayConfig::for_testing())),
        Arc::new(facade),
        ActionRegistry::default(),
    );
    create_router(Arc::new(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn datasource() -> Value {
    json!({"region": "us-east-1", "accessKeyId": "AKIDEXAMPLE", "secretAccessKey": "secret"})
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(MockHandle::new()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
    assert!(body["uptime"].is_number());
}

#[tokio::test]
async fn test_list_actions() {
    let request = Request::builder().uri("/actions").body(Body::empty()).unwrap();
    let (status, body) = send(app(MockHandle::new()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actions"].as_array().map(Vec::len), Some(Action::ALL.len()));
    assert_eq!(body["actions"][0], "listTables");
    assert_eq!(body["dynamicProperties"], json!(["action", "body"]));
    assert_eq!(body["escapeStringProperties"], json!(["body"]));
}

#[tokio::test]
async fn test_execute() {
    let handle = MockHandle::new().respond(Action::Scan, json!({"Items": [], "Count": 0, "ScannedCount": 0}));
    let request = post(
        "/execute",
        json!({
            "datasource": datasource(),
            "actionConfiguration": {"action": "scan", "body": "{\"TableName\":\"Users\"}"}
        }),
    );
    let (status, body) = send(app(handle), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"output": {"Items": [], "Count": 0, "ScannedCount": 0}}));
}

#[tokio::test]
async fn test_execute_failure_is_bad_gateway() {
    let request = post(
        "/execute",
        json!({
            "datasource": datasource(),
            "actionConfiguration": {"action": "constructor", "body": "{}"}
        }),
    );
    let (status, body) = send(app(MockHandle::new()), request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"]["message"],
        "DynamoDB request failed, Invalid DynamoDB action constructor"
    );
    assert_eq!(body["error"]["code"], 502);
}

#[tokio::test]
async fn test_malformed_request_is_bad_request() {
    let request = post("/execute", json!({"actionConfiguration": {"action": "scan"}}));
    let (status, body) = send(app(MockHandle::new()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);
}

#[tokio::test]
async fn test_metadata() {
    let request = post("/metadata", json!({"datasource": datasource()}));
    let (status, body) = send(app(MockHandle::new().with_tables(&["Users", "Orders"])), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"dbSchema": {"tables": [
            {"type": "TABLE", "name": "Users", "columns": []},
            {"type": "TABLE", "name": "Orders", "columns": []}
        ]}})
    );
}

#[tokio::test]
async fn test_connection_test() {
    let (status, body) = send(
        app(MockHandle::new().with_tables(&[])),
        post("/test", json!({"datasource": datasource()})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let broken = MockHandle::new().fail(Action::ListTables, "connection refused", FailureClass::Connection);
    let (status, body) = send(app(broken), post("/test", json!({"datasource": datasource()}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["message"], "DynamoDB listTables operation failed, connection refused");
}

#[tokio::test]
async fn test_describe() {
    let request = post("/describe", json!({"action": "batchWriteItem", "body": "{\"RequestItems\":{}}"}));
    let (status, body) = send(app(MockHandle::new()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"], "Action: Batch Write Item\n\nParams:\n{\"RequestItems\":{}}");
}
