use std::collections::HashMap;

use aws_sdk_dynamodb::{
    types::{ReturnValue, Select},
    Client,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{expression_values, optional_item, put, put_attributes, required_item};
use crate::{aws::attribute, error::Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct GetItemParams {
    pub table_name: String,
    pub key: Value,
    pub consistent_read: Option<bool>,
    pub projection_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct PutItemParams {
    pub table_name: String,
    pub item: Value,
    pub condition_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<HashMap<String, Value>>,
    pub return_values: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct UpdateItemParams {
    pub table_name: String,
    pub key: Value,
    pub update_expression: Option<String>,
    pub condition_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<HashMap<String, Value>>,
    pub return_values: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DeleteItemParams {
    pub table_name: String,
    pub key: Value,
    pub condition_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<HashMap<String, Value>>,
    pub return_values: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct QueryParams {
    pub table_name: String,
    pub index_name: Option<String>,
    pub key_condition_expression: Option<String>,
    pub filter_expression: Option<String>,
    pub projection_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<HashMap<String, Value>>,
    pub exclusive_start_key: Option<Value>,
    pub limit: Option<i32>,
    pub scan_index_forward: Option<bool>,
    pub consistent_read: Option<bool>,
    pub select: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ScanParams {
    pub table_name: String,
    pub index_name: Option<String>,
    pub filter_expression: Option<String>,
    pub projection_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<HashMap<String, Value>>,
    pub exclusive_start_key: Option<Value>,
    pub limit: Option<i32>,
    pub consistent_read: Option<bool>,
    pub select: Option<String>,
    pub segment: Option<i32>,
    pub total_segments: Option<i32>,
}

pub(super) async fn get_item(client: &Client, params: GetItemParams) -> Result<Value> {
    let output = client
        .get_item()
        .table_name(params.table_name)
        .set_key(required_item(&params.key)?)
        .set_consistent_read(params.consistent_read)
        .set_projection_expression(params.projection_expression)
        .set_expression_attribute_names(params.expression_attribute_names)
        .send()
        .await?;

    let mut out = Map::new();
    put_attributes(&mut out, "Item", output.item.as_ref());
    Ok(Value::Object(out))
}

pub(super) async fn put_item(client: &Client, params: PutItemParams) -> Result<Value> {
    let output = client
        .put_item()
        .table_name(params.table_name)
        .set_item(required_item(&params.item)?)
        .set_condition_expression(params.condition_expression)
        .set_expression_attribute_names(params.expression_attribute_names)
        .set_expression_attribute_values(expression_values(params.expression_attribute_values.as_ref())?)
        .set_return_values(params.return_values.as_deref().map(ReturnValue::from))
        .send()
        .await?;

    let mut out = Map::new();
    put_attributes(&mut out, "Attributes", output.attributes.as_ref());
    Ok(Value::Object(out))
}

pub(super) async fn update_item(client: &Client, params: UpdateItemParams) -> Result<Value> {
    let output = client
        .update_item()
        .table_name(params.table_name)
        .set_key(required_item(&params.key)?)
        .set_update_expression(params.update_expression)
        .set_condition_expression(params.condition_expression)
        .set_expression_attribute_names(params.expression_attribute_names)
        .set_expression_attribute_values(expression_values(params.expression_attribute_values.as_ref())?)
        .set_return_values(params.return_values.as_deref().map(ReturnValue::from))
        .send()
        .await?;

    let mut out = Map::new();
    put_attributes(&mut out, "Attributes", output.attributes.as_ref());
    Ok(Value::Object(out))
}

pub(super) async fn delete_item(client: &Client, params: DeleteItemParams) -> Result<Value> {
    let output = client
        .delete_item()
        .table_name(params.table_name)
        .set_key(required_item(&params.key)?)
        .set_condition_expression(params.condition_expression)
        .set_expression_attribute_names(params.expression_attribute_names)
        .set_expression_attribute_values(expression_values(params.expression_attribute_values.as_ref())?)
        .set_return_values(params.return_values.as_deref().map(ReturnValue::from))
        .send()
        .await?;

    let mut out = Map::new();
    put_attributes(&mut out, "Attributes", output.attributes.as_ref());
    Ok(Value::Object(out))
}

pub(super) async fn query(client: &Client, params: QueryParams) -> Result<Value> {
    let output = client
        .query()
        .table_name(params.table_name)
        .set_index_name(params.index_name)
        .set_key_condition_expression(params.key_condition_expression)
        .set_filter_expression(params.filter_expression)
        .set_projection_expression(params.projection_expression)
        .set_expression_attribute_names(params.expression_attribute_names)
        .set_expression_attribute_values(expression_values(params.expression_attribute_values.as_ref())?)
        .set_exclusive_start_key(optional_item(params.exclusive_start_key.as_ref())?)
        .set_limit(params.limit)
        .set_scan_index_forward(params.scan_index_forward)
        .set_consistent_read(params.consistent_read)
        .set_select(params.select.as_deref().map(Select::from))
        .send()
        .await?;

    let mut out = Map::new();
    out.insert(
        "Items".to_string(),
        attribute::from_items(output.items.as_deref().unwrap_or_default()),
    );
    put(&mut out, "Count", json!(output.count));
    put(&mut out, "ScannedCount", json!(output.scanned_count));
    put_attributes(&mut out, "LastEvaluatedKey", output.last_evaluated_key.as_ref());
    Ok(Value::Object(out))
}

pub(super) async fn scan(client: &Client, params: ScanParams) -> Result<Value> {
    let output = client
        .scan()
        .table_name(params.table_name)
        .set_index_name(params.index_name)
        .set_filter_expression(params.filter_expression)
        .set_projection_expression(params.projection_expression)
        .set_expression_attribute_names(params.expression_attribute_names)
        .set_expression_attribute_values(expression_values(params.expression_attribute_values.as_ref())?)
        .set_exclusive_start_key(optional_item(params.exclusive_start_key.as_ref())?)
        .set_limit(params.limit)
        .set_consistent_read(params.consistent_read)
        .set_select(params.select.as_deref().map(Select::from))
        .set_segment(params.segment)
        .set_total_segments(params.total_segments)
        .send()
        .await?;

    let mut out = Map::new();
    out.insert(
        "Items".to_string(),
        attribute::from_items(output.items.as_deref().unwrap_or_default()),
    );
    put(&mut out, "Count", json!(output.count));
    put(&mut out, "ScannedCount", json!(output.scanned_count));
    put_attributes(&mut out, "LastEvaluatedKey", output.last_evaluated_key.as_ref());
    Ok(Value::Object(out))
}
