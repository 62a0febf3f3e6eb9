//! Runs against DynamoDB Local. Set `DYNAMODB_ENDPOINT` to override the
//! default `http://localhost:8000`.

use dynamo_gateway::{
    ActionConfiguration, Context, DatasourceConfig, DatasourcePlugin, ExecutionFacade, GatewayConfig,
};
use serde_json::json;
use uuid::Uuid;

fn datasource() -> DatasourceConfig {
    let endpoint = std::env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| "http://localhost:8000".to_string());
    DatasourceConfig::new("us-east-1")
        .with_credentials("local", "local")
        .with_endpoint(endpoint)
}

async fn run(facade: &ExecutionFacade, action: &str, body: serde_json::Value) -> serde_json::Value {
    facade
        .execute(&datasource(), &ActionConfiguration::new(action, body.to_string()))
        .await
        .unwrap_or_else(|e| panic!("{} failed: {}", action, e))
        .output
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn test_table_lifecycle() {
    let facade = ExecutionFacade::from_context(&Context::new(GatewayConfig::for_testing()));
    let table = format!("gateway-test-{}", Uuid::new_v4());

    run(
        &facade,
        "createTable",
        json!({
            "TableName": table,
            "AttributeDefinitions": [{"AttributeName": "id", "AttributeType": "S"}],
            "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}],
            "BillingMode": "PAY_PER_REQUEST"
        }),
    )
    .await;

    let metadata = facade.metadata(&datasource()).await.expect("metadata failed");
    assert!(metadata.db_schema.tables.iter().any(|t| t.name == table));

    run(
        &facade,
        "putItem",
        json!({"TableName": table, "Item": {"id": {"S": "1"}, "name": {"S": "Ada"}, "visits": {"N": "3"}}}),
    )
    .await;

    run(
        &facade,
        "updateItem",
        json!({
            "TableName": table,
            "Key": {"id": {"S": "1"}},
            "UpdateExpression": "SET visits = visits + :one",
            "ExpressionAttributeValues": {":one": {"N": "1"}}
        }),
    )
    .await;

    let got = run(&facade, "getItem", json!({"TableName": table, "Key": {"id": {"S": "1"}}})).await;
    assert_eq!(got["Item"]["visits"], json!({"N": "4"}));

    let scanned = run(&facade, "scan", json!({"TableName": table})).await;
    assert_eq!(scanned["Count"], 1);

    run(&facade, "deleteItem", json!({"TableName": table, "Key": {"id": {"S": "1"}}})).await;
    let got = run(&facade, "getItem", json!({"TableName": table, "Key": {"id": {"S": "1"}}})).await;
    assert!(got.get("Item").is_none());

    run(&facade, "deleteTable", json!({"TableName": table})).await;
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn test_connection_check() {
    let facade = ExecutionFacade::from_context(&Context::new(GatewayConfig::for_testing()));
    facade.test(&datasource()).await.expect("DynamoDB Local unreachable");
}
