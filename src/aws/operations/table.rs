use aws_sdk_dynamodb::{
    primitives::DateTime as SdkDateTime,
    types::{
        AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
        ProjectionType, ProvisionedThroughput, ScalarAttributeType, TableDescription,
    },
    Client,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{build_error, put};
use crate::error::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ListTablesParams {
    pub exclusive_start_table_name: Option<String>,
    pub limit: Option<i32>,
}

/// Parameters of describeTable and deleteTable
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TableNameParams {
    pub table_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct KeySchemaParam {
    pub attribute_name: String,
    pub key_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct AttributeDefinitionParam {
    pub attribute_name: String,
    pub attribute_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ThroughputParam {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ProjectionParam {
    pub projection_type: Option<String>,
    pub non_key_attributes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct GlobalSecondaryIndexParam {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaParam>,
    pub projection: ProjectionParam,
    pub provisioned_throughput: Option<ThroughputParam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CreateTableParams {
    pub table_name: String,
    pub key_schema: Vec<KeySchemaParam>,
    #[serde(default)]
    pub attribute_definitions: Vec<AttributeDefinitionParam>,
    pub billing_mode: Option<String>,
    pub provisioned_throughput: Option<ThroughputParam>,
    #[serde(default)]
    pub global_secondary_indexes: Vec<GlobalSecondaryIndexParam>,
}

pub(super) async fn list_tables(client: &Client, params: ListTablesParams) -> Result<Value> {
    let output = client
        .list_tables()
        .set_exclusive_start_table_name(params.exclusive_start_table_name)
        .set_limit(params.limit)
        .send()
        .await?;

    let mut out = Map::new();
    out.insert("TableNames".to_string(), json!(output.table_names.unwrap_or_default()));
    put(&mut out, "LastEvaluatedTableName", json!(output.last_evaluated_table_name));
    Ok(Value::Object(out))
}

pub(super) async fn describe_table(client: &Client, params: TableNameParams) -> Result<Value> {
    let output = client.describe_table().table_name(params.table_name).send().await?;

    let mut out = Map::new();
    if let Some(table) = output.table.as_ref() {
        out.insert("Table".to_string(), table_description(table));
    }
    Ok(Value::Object(out))
}

pub(super) async fn create_table(client: &Client, params: CreateTableParams) -> Result<Value> {
    let attribute_definitions = params
        .attribute_definitions
        .into_iter()
        .map(|def| {
            AttributeDefinition::builder()
                .attribute_name(def.attribute_name)
                .attribute_type(ScalarAttributeType::from(def.attribute_type.as_str()))
                .build()
                .map_err(build_error)
        })
        .collect::<Result<Vec<_>>>()?;

    let global_secondary_indexes = params
        .global_secondary_indexes
        .into_iter()
        .map(global_secondary_index)
        .collect::<Result<Vec<_>>>()?;

    let output = client
        .create_table()
        .table_name(params.table_name)
        .set_key_schema(Some(key_schema(params.key_schema)?))
        .set_attribute_definitions(non_empty(attribute_definitions))
        .set_billing_mode(params.billing_mode.as_deref().map(BillingMode::from))
        .set_provisioned_throughput(params.provisioned_throughput.map(throughput).transpose()?)
        .set_global_secondary_indexes(non_empty(global_secondary_indexes))
        .send()
        .await?;

    Ok(described("TableDescription", output.table_description.as_ref()))
}

pub(super) async fn delete_table(client: &Client, params: TableNameParams) -> Result<Value> {
    let output = client.delete_table().table_name(params.table_name).send().await?;
    Ok(described("TableDescription", output.table_description.as_ref()))
}

fn described(key: &str, table: Option<&TableDescription>) -> Value {
    let mut out = Map::new();
    if let Some(table) = table {
        out.insert(key.to_string(), table_description(table));
    }
    Value::Object(out)
}

fn key_schema(params: Vec<KeySchemaParam>) -> Result<Vec<KeySchemaElement>> {
    params
        .into_iter()
        .map(|key| {
            KeySchemaElement::builder()
                .attribute_name(key.attribute_name)
                .key_type(KeyType::from(key.key_type.as_str()))
                .build()
                .map_err(build_error)
        })
        .collect()
}

fn throughput(params: ThroughputParam) -> Result<ProvisionedThroughput> {
    ProvisionedThroughput::builder()
        .read_capacity_units(params.read_capacity_units)
        .write_capacity_units(params.write_capacity_units)
        .build()
        .map_err(build_error)
}

fn global_secondary_index(params: GlobalSecondaryIndexParam) -> Result<GlobalSecondaryIndex> {
    let projection = Projection::builder()
        .set_projection_type(params.projection.projection_type.as_deref().map(ProjectionType::from))
        .set_non_key_attributes(params.projection.non_key_attributes)
        .build();

    GlobalSecondaryIndex::builder()
        .index_name(params.index_name)
        .set_key_schema(Some(key_schema(params.key_schema)?))
        .projection(projection)
        .set_provisioned_throughput(params.provisioned_throughput.map(throughput).transpose()?)
        .build()
        .map_err(build_error)
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn timestamp(value: &SdkDateTime) -> Value {
    DateTime::<Utc>::from_timestamp(value.secs(), value.subsec_nanos())
        .map(|dt| Value::String(dt.to_rfc3339()))
        .unwrap_or(Value::Null)
}

fn encode_key_schema(keys: &[KeySchemaElement]) -> Value {
    Value::Array(
        keys.iter()
            .map(|key| json!({"AttributeName": key.attribute_name(), "KeyType": key.key_type().as_str()}))
            .collect(),
    )
}

/// Encode the parts of a table description a host is likely to show
pub(crate) fn table_description(table: &TableDescription) -> Value {
    let mut out = Map::new();
    put(&mut out, "TableName", json!(table.table_name));
    put(&mut out, "TableStatus", json!(table.table_status.as_ref().map(|s| s.as_str())));
    put(&mut out, "TableArn", json!(table.table_arn));
    put(&mut out, "TableId", json!(table.table_id));
    put(&mut out, "ItemCount", json!(table.item_count));
    put(&mut out, "TableSizeBytes", json!(table.table_size_bytes));
    if let Some(created) = table.creation_date_time.as_ref() {
        put(&mut out, "CreationDateTime", timestamp(created));
    }
    if let Some(keys) = table.key_schema.as_ref() {
        out.insert("KeySchema".to_string(), encode_key_schema(keys));
    }
    if let Some(definitions) = table.attribute_definitions.as_ref() {
        let definitions: Vec<Value> = definitions
            .iter()
            .map(|def| {
                json!({"AttributeName": def.attribute_name(), "AttributeType": def.attribute_type().as_str()})
            })
            .collect();
        out.insert("AttributeDefinitions".to_string(), Value::Array(definitions));
    }
    if let Some(mode) = table.billing_mode_summary.as_ref().and_then(|s| s.billing_mode.as_ref()) {
        out.insert("BillingModeSummary".to_string(), json!({"BillingMode": mode.as_str()}));
    }
    if let Some(throughput) = table.provisioned_throughput.as_ref() {
        let mut encoded = Map::new();
        put(&mut encoded, "ReadCapacityUnits", json!(throughput.read_capacity_units));
        put(&mut encoded, "WriteCapacityUnits", json!(throughput.write_capacity_units));
        put(&mut encoded, "NumberOfDecreasesToday", json!(throughput.number_of_decreases_today));
        out.insert("ProvisionedThroughput".to_string(), Value::Object(encoded));
    }
    if let Some(indexes) = table.global_secondary_indexes.as_ref() {
        let indexes: Vec<Value> = indexes
            .iter()
            .map(|index| {
                let mut encoded = Map::new();
                put(&mut encoded, "IndexName", json!(index.index_name));
                put(&mut encoded, "IndexStatus", json!(index.index_status.as_ref().map(|s| s.as_str())));
                put(&mut encoded, "ItemCount", json!(index.item_count));
                if let Some(keys) = index.key_schema.as_ref() {
                    encoded.insert("KeySchema".to_string(), encode_key_schema(keys));
                }
                if let Some(projection) = index.projection.as_ref() {
                    let mut p = Map::new();
                    put(&mut p, "ProjectionType", json!(projection.projection_type.as_ref().map(|t| t.as_str())));
                    put(&mut p, "NonKeyAttributes", json!(projection.non_key_attributes));
                    encoded.insert("Projection".to_string(), Value::Object(p));
                }
                Value::Object(encoded)
            })
            .collect();
        out.insert("GlobalSecondaryIndexes".to_string(), Value::Array(indexes));
    }
    Value::Object(out)
}
