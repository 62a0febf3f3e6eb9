//! Multi-item actions: batches, transactions and PartiQL statements.

use std::collections::HashMap;

use aws_sdk_dynamodb::{
    types::{
        ConditionCheck, Delete, DeleteRequest, Get, KeysAndAttributes, Put, PutRequest, TransactGetItem,
        TransactWriteItem, Update, WriteRequest,
    },
    Client,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{build_error, expression_values, put, put_attributes, required_item};
use crate::{
    aws::attribute,
    error::{Error, Result},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct KeysAndAttributesParam {
    pub keys: Vec<Value>,
    pub projection_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub consistent_read: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct BatchGetItemParams {
    pub request_items: HashMap<String, KeysAndAttributesParam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct PutRequestParam {
    pub item: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DeleteRequestParam {
    pub key: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct WriteRequestParam {
    pub put_request: Option<PutRequestParam>,
    pub delete_request: Option<DeleteRequestParam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct BatchWriteItemParams {
    pub request_items: HashMap<String, Vec<WriteRequestParam>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct GetParam {
    pub table_name: String,
    pub key: Value,
    pub projection_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TransactGetParam {
    pub get: GetParam,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TransactGetItemsParams {
    pub transact_items: Vec<TransactGetParam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TransactPutParam {
    pub table_name: String,
    pub item: Value,
    pub condition_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TransactUpdateParam {
    pub table_name: String,
    pub key: Value,
    pub update_expression: String,
    pub condition_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<HashMap<String, Value>>,
}

/// Shared by transactional deletes and condition checks
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TransactKeyParam {
    pub table_name: String,
    pub key: Value,
    pub condition_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TransactWriteParam {
    pub put: Option<TransactPutParam>,
    pub update: Option<TransactUpdateParam>,
    pub delete: Option<TransactKeyParam>,
    pub condition_check: Option<TransactKeyParam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TransactWriteItemsParams {
    pub transact_items: Vec<TransactWriteParam>,
    pub client_request_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ExecuteStatementParams {
    pub statement: String,
    pub parameters: Option<Vec<Value>>,
    pub consistent_read: Option<bool>,
    pub next_token: Option<String>,
    pub limit: Option<i32>,
}

pub(super) async fn batch_get_item(client: &Client, params: BatchGetItemParams) -> Result<Value> {
    let mut request_items = HashMap::with_capacity(params.request_items.len());
    for (table, request) in params.request_items {
        let keys = request
            .keys
            .iter()
            .map(attribute::to_item)
            .collect::<Result<Vec<_>>>()?;
        let keys_and_attributes = KeysAndAttributes::builder()
            .set_keys(Some(keys))
            .set_projection_expression(request.projection_expression)
            .set_expression_attribute_names(request.expression_attribute_names)
            .set_consistent_read(request.consistent_read)
            .build()
            .map_err(build_error)?;
        request_items.insert(table, keys_and_attributes);
    }

    let output = client
        .batch_get_item()
        .set_request_items(Some(request_items))
        .send()
        .await?;

    let responses: Map<String, Value> = output
        .responses
        .unwrap_or_default()
        .iter()
        .map(|(table, items)| (table.clone(), attribute::from_items(items)))
        .collect();
    let unprocessed: Map<String, Value> = output
        .unprocessed_keys
        .unwrap_or_default()
        .iter()
        .map(|(table, request)| {
            let mut encoded = Map::new();
            encoded.insert("Keys".to_string(), attribute::from_items(request.keys()));
            put(&mut encoded, "ProjectionExpression", json!(request.projection_expression()));
            put(&mut encoded, "ExpressionAttributeNames", json!(request.expression_attribute_names()));
            put(&mut encoded, "ConsistentRead", json!(request.consistent_read()));
            (table.clone(), Value::Object(encoded))
        })
        .collect();

    Ok(json!({"Responses": responses, "UnprocessedKeys": unprocessed}))
}

pub(super) async fn batch_write_item(client: &Client, params: BatchWriteItemParams) -> Result<Value> {
    let mut request_items = HashMap::with_capacity(params.request_items.len());
    for (table, requests) in params.request_items {
        let requests = requests
            .into_iter()
            .map(write_request)
            .collect::<Result<Vec<_>>>()?;
        request_items.insert(table, requests);
    }

    let output = client
        .batch_write_item()
        .set_request_items(Some(request_items))
        .send()
        .await?;

    let unprocessed: Map<String, Value> = output
        .unprocessed_items
        .unwrap_or_default()
        .iter()
        .map(|(table, requests)| {
            let encoded = requests.iter().map(encode_write_request).collect();
            (table.clone(), Value::Array(encoded))
        })
        .collect();

    Ok(json!({"UnprocessedItems": unprocessed}))
}

pub(super) async fn transact_get_items(client: &Client, params: TransactGetItemsParams) -> Result<Value> {
    let items = params
        .transact_items
        .into_iter()
        .map(|item| {
            let get = Get::builder()
                .table_name(item.get.table_name)
                .set_key(required_item(&item.get.key)?)
                .set_projection_expression(item.get.projection_expression)
                .set_expression_attribute_names(item.get.expression_attribute_names)
                .build()
                .map_err(build_error)?;
            Ok::<_, Error>(TransactGetItem::builder().get(get).build())
        })
        .collect::<Result<Vec<_>>>()?;

    let output = client
        .transact_get_items()
        .set_transact_items(Some(items))
        .send()
        .await?;

    let responses: Vec<Value> = output
        .responses
        .unwrap_or_default()
        .iter()
        .map(|response| {
            let mut encoded = Map::new();
            put_attributes(&mut encoded, "Item", response.item.as_ref());
            Value::Object(encoded)
        })
        .collect();

    Ok(json!({"Responses": responses}))
}

pub(super) async fn transact_write_items(client: &Client, params: TransactWriteItemsParams) -> Result<Value> {
    let items = params
        .transact_items
        .into_iter()
        .map(transact_write_item)
        .collect::<Result<Vec<_>>>()?;

    client
        .transact_write_items()
        .set_transact_items(Some(items))
        .set_client_request_token(params.client_request_token)
        .send()
        .await?;

    Ok(json!({}))
}

pub(super) async fn execute_statement(client: &Client, params: ExecuteStatementParams) -> Result<Value> {
    let parameters = params
        .parameters
        .map(|values| {
            values
                .iter()
                .map(attribute::to_attribute_value)
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    let output = client
        .execute_statement()
        .statement(params.statement)
        .set_parameters(parameters)
        .set_consistent_read(params.consistent_read)
        .set_next_token(params.next_token)
        .set_limit(params.limit)
        .send()
        .await?;

    let mut out = Map::new();
    out.insert(
        "Items".to_string(),
        attribute::from_items(output.items.as_deref().unwrap_or_default()),
    );
    put(&mut out, "NextToken", json!(output.next_token));
    put_attributes(&mut out, "LastEvaluatedKey", output.last_evaluated_key.as_ref());
    Ok(Value::Object(out))
}

fn write_request(param: WriteRequestParam) -> Result<WriteRequest> {
    let put_request = param
        .put_request
        .map(|p| {
            PutRequest::builder()
                .set_item(required_item(&p.item)?)
                .build()
                .map_err(build_error)
        })
        .transpose()?;
    let delete_request = param
        .delete_request
        .map(|d| {
            DeleteRequest::builder()
                .set_key(required_item(&d.key)?)
                .build()
                .map_err(build_error)
        })
        .transpose()?;

    if put_request.is_some() == delete_request.is_some() {
        return Err(Error::InvalidParameters(
            "each write request needs exactly one of PutRequest or DeleteRequest".to_string(),
        ));
    }

    Ok(WriteRequest::builder()
        .set_put_request(put_request)
        .set_delete_request(delete_request)
        .build())
}

fn encode_write_request(request: &WriteRequest) -> Value {
    if let Some(put_request) = request.put_request() {
        json!({"PutRequest": {"Item": attribute::from_item(put_request.item())}})
    } else if let Some(delete_request) = request.delete_request() {
        json!({"DeleteRequest": {"Key": attribute::from_item(delete_request.key())}})
    } else {
        json!({})
    }
}

fn transact_write_item(param: TransactWriteParam) -> Result<TransactWriteItem> {
    let set = [
        param.put.is_some(),
        param.update.is_some(),
        param.delete.is_some(),
        param.condition_check.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count();
    if set != 1 {
        return Err(Error::InvalidParameters(
            "each transact item needs exactly one of Put, Update, Delete or ConditionCheck".to_string(),
        ));
    }

    let mut builder = TransactWriteItem::builder();
    if let Some(p) = param.put {
        builder = builder.put(
            Put::builder()
                .table_name(p.table_name)
                .set_item(required_item(&p.item)?)
                .set_condition_expression(p.condition_expression)
                .set_expression_attribute_names(p.expression_attribute_names)
                .set_expression_attribute_values(expression_values(p.expression_attribute_values.as_ref())?)
                .build()
                .map_err(build_error)?,
        );
    }
    if let Some(u) = param.update {
        builder = builder.update(
            Update::builder()
                .table_name(u.table_name)
                .set_key(required_item(&u.key)?)
                .update_expression(u.update_expression)
                .set_condition_expression(u.condition_expression)
                .set_expression_attribute_names(u.expression_attribute_names)
                .set_expression_attribute_values(expression_values(u.expression_attribute_values.as_ref())?)
                .build()
                .map_err(build_error)?,
        );
    }
    if let Some(d) = param.delete {
        builder = builder.delete(
            Delete::builder()
                .table_name(d.table_name)
                .set_key(required_item(&d.key)?)
                .set_condition_expression(d.condition_expression)
                .set_expression_attribute_names(d.expression_attribute_names)
                .set_expression_attribute_values(expression_values(d.expression_attribute_values.as_ref())?)
                .build()
                .map_err(build_error)?,
        );
    }
    if let Some(c) = param.condition_check {
        let condition = c.condition_expression.ok_or_else(|| {
            Error::InvalidParameters("ConditionCheck requires a ConditionExpression".to_string())
        })?;
        builder = builder.condition_check(
            ConditionCheck::builder()
                .table_name(c.table_name)
                .set_key(required_item(&c.key)?)
                .condition_expression(condition)
                .set_expression_attribute_names(c.expression_attribute_names)
                .set_expression_attribute_values(expression_values(c.expression_attribute_values.as_ref())?)
                .build()
                .map_err(build_error)?,
        );
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_request_needs_one_operation() {
        let both: WriteRequestParam = serde_json::from_value(json!({
            "PutRequest": {"Item": {"id": {"S": "1"}}},
            "DeleteRequest": {"Key": {"id": {"S": "2"}}}
        }))
        .unwrap();
        assert!(write_request(both).is_err());

        let neither: WriteRequestParam = serde_json::from_value(json!({})).unwrap();
        assert!(write_request(neither).is_err());
    }

    #[test]
    fn test_write_request_encodes_back() {
        let param: WriteRequestParam = serde_json::from_value(json!({
            "DeleteRequest": {"Key": {"id": {"S": "2"}}}
        }))
        .unwrap();
        let request = write_request(param).unwrap();
        assert_eq!(
            encode_write_request(&request),
            json!({"DeleteRequest": {"Key": {"id": {"S": "2"}}}})
        );
    }

    #[test]
    fn test_transact_write_item_requires_single_operation() {
        let param: TransactWriteParam = serde_json::from_value(json!({
            "Put": {"TableName": "Users", "Item": {"id": {"S": "1"}}},
            "Delete": {"TableName": "Users", "Key": {"id": {"S": "1"}}}
        }))
        .unwrap();
        assert!(transact_write_item(param).is_err());
    }

    #[test]
    fn test_condition_check_requires_expression() {
        let param: TransactWriteParam = serde_json::from_value(json!({
            "ConditionCheck": {"TableName": "Users", "Key": {"id": {"S": "1"}}}
        }))
        .unwrap();
        let err = transact_write_item(param).unwrap_err();
        assert!(err.to_string().contains("ConditionExpression"));
    }

    #[test]
    fn test_transact_put_builds() {
        let param: TransactWriteParam = serde_json::from_value(json!({
            "Put": {
                "TableName": "Users",
                "Item": {"id": {"S": "1"}},
                "ConditionExpression": "attribute_not_exists(id)"
            }
        }))
        .unwrap();
        let item = transact_write_item(param).unwrap();
        assert_eq!(item.put().map(|p| p.table_name()), Some("Users"));
    }
}
