//! One statically bound function per registered action.
//!
//! Each binding decodes a PascalCase parameter struct, drives the matching
//! SDK fluent builder and encodes the output in the DynamoDB API shape.
//! Parameter structs reject unknown keys so an unsupported option (say, a
//! condition on a write) is never silently dropped.

use std::collections::HashMap;
use std::fmt;

use aws_sdk_dynamodb::Client;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    aws::attribute::{self, Item},
    error::{Error, Result},
    registry::Action,
};

mod batch;
mod item;
mod table;

pub use batch::{
    BatchGetItemParams, BatchWriteItemParams, ExecuteStatementParams, TransactGetItemsParams,
    TransactWriteItemsParams,
};
pub use item::{DeleteItemParams, GetItemParams, PutItemParams, QueryParams, ScanParams, UpdateItemParams};
pub use table::{CreateTableParams, ListTablesParams, TableNameParams};

/// Run `action` on `client` with a JSON parameter object
pub async fn invoke(client: &Client, action: Action, params: Map<String, Value>) -> Result<Value> {
    match action {
        Action::ListTables => table::list_tables(client, decode(action, params)?).await,
        Action::DescribeTable => table::describe_table(client, decode(action, params)?).await,
        Action::CreateTable => table::create_table(client, decode(action, params)?).await,
        Action::DeleteTable => table::delete_table(client, decode(action, params)?).await,
        Action::GetItem => item::get_item(client, decode(action, params)?).await,
        Action::PutItem => item::put_item(client, decode(action, params)?).await,
        Action::UpdateItem => item::update_item(client, decode(action, params)?).await,
        Action::DeleteItem => item::delete_item(client, decode(action, params)?).await,
        Action::Query => item::query(client, decode(action, params)?).await,
        Action::Scan => item::scan(client, decode(action, params)?).await,
        Action::BatchGetItem => batch::batch_get_item(client, decode(action, params)?).await,
        Action::BatchWriteItem => batch::batch_write_item(client, decode(action, params)?).await,
        Action::TransactGetItems => batch::transact_get_items(client, decode(action, params)?).await,
        Action::TransactWriteItems => batch::transact_write_items(client, decode(action, params)?).await,
        Action::ExecuteStatement => batch::execute_statement(client, decode(action, params)?).await,
    }
}

/// Decode the parameter object of `action` into its typed form
pub fn decode<T: DeserializeOwned>(action: Action, params: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(params))
        .map_err(|e| Error::InvalidParameters(format!("Invalid parameters for {}: {}", action, e)))
}

fn build_error(e: impl fmt::Display) -> Error {
    Error::InvalidParameters(e.to_string())
}

fn optional_item(value: Option<&Value>) -> Result<Option<Item>> {
    value.map(attribute::to_item).transpose()
}

fn required_item(value: &Value) -> Result<Option<Item>> {
    attribute::to_item(value).map(Some)
}

/// `ExpressionAttributeValues` share the attribute-map shape
fn expression_values(values: Option<&HashMap<String, Value>>) -> Result<Option<Item>> {
    values
        .map(|values| {
            values
                .iter()
                .map(|(name, value)| {
                    attribute::to_attribute_value(value)
                        .map(|attr| (name.clone(), attr))
                        .map_err(|e| Error::InvalidParameters(format!("value {}: {}", name, e)))
                })
                .collect::<Result<Item>>()
        })
        .transpose()
}

/// Insert unless the value is null, so absent output fields stay absent
fn put(out: &mut Map<String, Value>, key: &str, value: Value) {
    if !value.is_null() {
        out.insert(key.to_string(), value);
    }
}

fn put_attributes(out: &mut Map<String, Value>, key: &str, item: Option<&Item>) {
    if let Some(item) = item {
        out.insert(key.to_string(), attribute::from_item(item));
    }
}
