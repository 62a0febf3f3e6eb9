//! Drives the real SDK client against a local stub of the DynamoDB JSON protocol.

use std::sync::Arc;

use dynamo_gateway::{
    Action, ActionConfiguration, ActionDispatcher, Context, DatasourceConfig, DatasourcePlugin, ExecutionFacade,
    GatewayConfig, SdkConnectionProvider,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, header, method},
    Match, Mock, MockServer, ResponseTemplate,
};

const TARGET_PREFIX: &str = "DynamoDB_20120810.";

fn reply(status: u16, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/x-amz-json-1.0")
}

fn target(operation: &str) -> impl Match {
    header("x-amz-target", format!("{}{}", TARGET_PREFIX, operation).as_str())
}

fn datasource(server: &MockServer) -> DatasourceConfig {
    DatasourceConfig::new("us-east-1")
        .with_credentials("AKIDEXAMPLE", "secret")
        .with_endpoint(server.uri())
}

fn gateway() -> (Arc<SdkConnectionProvider>, ExecutionFacade) {
    let context = Context::new(GatewayConfig::for_testing());
    let provider = Arc::new(SdkConnectionProvider::new(context.clone()));
    let facade = ExecutionFacade::new(provider.clone(), ActionDispatcher::from_context(&context));
    (provider, facade)
}

#[tokio::test]
async fn test_get_item_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(target("GetItem"))
        .and(body_partial_json(json!({"TableName": "Users", "Key": {"id": {"S": "1"}}})))
        .respond_with(reply(200, json!({"Item": {"id": {"S": "1"}, "visits": {"N": "42"}}})))
        .expect(1)
        .mount(&server)
        .await;

    let (_, facade) = gateway();
    let output = facade
        .execute(
            &datasource(&server),
            &ActionConfiguration::new("getItem", r#"{"TableName":"Users","Key":{"id":{"S":"1"}}}"#),
        )
        .await
        .unwrap();

    assert_eq!(output.output, json!({"Item": {"id": {"S": "1"}, "visits": {"N": "42"}}}));
}

#[tokio::test]
async fn test_metadata_follows_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(target("ListTables"))
        .and(body_partial_json(json!({"ExclusiveStartTableName": "Orders"})))
        .respond_with(reply(200, json!({"TableNames": ["Sessions"]})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(target("ListTables"))
        .respond_with(reply(
            200,
            json!({"TableNames": ["Users", "Orders"], "LastEvaluatedTableName": "Orders"}),
        ))
        .mount(&server)
        .await;

    let (provider, facade) = gateway();
    let metadata = facade.metadata(&datasource(&server)).await.unwrap();

    let names: Vec<_> = metadata.db_schema.tables.iter().map(|t| t.name.clone()).collect();
    assert_eq!(names, vec!["Users", "Orders", "Sessions"]);
    assert_eq!(provider.cached(), 1);
}

#[tokio::test]
async fn test_metadata_stops_on_cycling_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(target("ListTables"))
        .and(body_partial_json(json!({"ExclusiveStartTableName": "A"})))
        .respond_with(reply(200, json!({"TableNames": ["B"], "LastEvaluatedTableName": "B"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(target("ListTables"))
        .and(body_partial_json(json!({"ExclusiveStartTableName": "B"})))
        .respond_with(reply(200, json!({"TableNames": ["C"], "LastEvaluatedTableName": "A"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(target("ListTables"))
        .respond_with(reply(200, json!({"TableNames": ["A"], "LastEvaluatedTableName": "A"})))
        .mount(&server)
        .await;

    let (_, facade) = gateway();
    let metadata = facade.metadata(&datasource(&server)).await.unwrap();

    let names: Vec<_> = metadata.db_schema.tables.iter().map(|t| t.name.clone()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(3));
}

/// Smallest body each action accepts
fn minimal_body(action: Action) -> Value {
    let key = json!({"id": {"S": "1"}});
    match action {
        Action::ListTables => json!({}),
        Action::DescribeTable | Action::DeleteTable => json!({"TableName": "Users"}),
        Action::CreateTable => json!({
            "TableName": "Users",
            "AttributeDefinitions": [{"AttributeName": "id", "AttributeType": "S"}],
            "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}],
            "BillingMode": "PAY_PER_REQUEST"
        }),
        Action::GetItem | Action::DeleteItem => json!({"TableName": "Users", "Key": key}),
        Action::PutItem => json!({"TableName": "Users", "Item": key}),
        Action::UpdateItem => json!({
            "TableName": "Users",
            "Key": key,
            "UpdateExpression": "SET visits = :one",
            "ExpressionAttributeValues": {":one": {"N": "1"}}
        }),
        Action::Query => json!({
            "TableName": "Users",
            "KeyConditionExpression": "id = :id",
            "ExpressionAttributeValues": {":id": {"S": "1"}}
        }),
        Action::Scan => json!({"TableName": "Users"}),
        Action::BatchGetItem => json!({"RequestItems": {"Users": {"Keys": [key]}}}),
        Action::BatchWriteItem => json!({"RequestItems": {"Users": [{"PutRequest": {"Item": key}}]}}),
        Action::TransactGetItems => json!({"TransactItems": [{"Get": {"TableName": "Users", "Key": key}}]}),
        Action::TransactWriteItems => json!({
            "TransactItems": [{"Put": {"TableName": "Users", "Item": key}}]
        }),
        Action::ExecuteStatement => json!({"Statement": "SELECT * FROM Users"}),
    }
}

#[tokio::test]
async fn test_every_action_succeeds_with_minimal_params() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(reply(200, json!({})))
        .mount(&server)
        .await;

    let (_, facade) = gateway();
    let ds = datasource(&server);
    for action in Action::ALL {
        let body = minimal_body(action).to_string();
        let result = facade
            .execute(&ds, &ActionConfiguration::new(action.name(), body))
            .await;
        assert!(result.is_ok(), "{} failed: {:?}", action, result.err());
    }

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), Action::ALL.len());
}

#[tokio::test]
async fn test_service_error_message_reaches_host() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(target("Query"))
        .respond_with(reply(
            400,
            json!({
                "__type": "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException",
                "message": "Requested resource not found"
            }),
        ))
        .mount(&server)
        .await;

    let (provider, facade) = gateway();
    let err = facade
        .execute(
            &datasource(&server),
            &ActionConfiguration::new(
                "query",
                r#"{"TableName":"Missing","KeyConditionExpression":"id = :id","ExpressionAttributeValues":{":id":{"S":"1"}}}"#,
            ),
        )
        .await
        .unwrap_err();

    assert_eq!(err.message, "DynamoDB request failed, Requested resource not found");
    // Data errors leave the client cached
    assert_eq!(provider.cached(), 1);
}

#[tokio::test]
async fn test_rejected_credentials_drop_cached_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(target("ListTables"))
        .respond_with(reply(
            400,
            json!({
                "__type": "com.amazon.coral.service#UnrecognizedClientException",
                "message": "The security token included in the request is invalid."
            }),
        ))
        .mount(&server)
        .await;

    let (provider, facade) = gateway();
    let err = facade.test(&datasource(&server)).await.unwrap_err();

    assert_eq!(
        err.message,
        "DynamoDB listTables operation failed, The security token included in the request is invalid."
    );
    assert_eq!(provider.cached(), 0);
}

#[tokio::test]
async fn test_invalid_params_never_reach_the_wire() {
    let server = MockServer::start().await;
    let (_, facade) = gateway();
    let ds = datasource(&server);

    let err = facade
        .execute(&ds, &ActionConfiguration::new("putItem", "Item=oops"))
        .await
        .unwrap_err();
    assert_eq!(err.message, "DynamoDB request failed, Expected params to be a structure");

    let err = facade
        .execute(&ds, &ActionConfiguration::new("getItem", r#"{"TableName":"Users","Kye":{}}"#))
        .await
        .unwrap_err();
    assert!(
        err.message.starts_with("DynamoDB request failed, Invalid parameters for getItem"),
        "{}",
        err.message
    );

    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}
