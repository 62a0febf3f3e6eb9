use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Connection parameters for one DynamoDB datasource
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceConfig {
    /// AWS region, e.g. `us-east-1`
    pub region: String,

    /// Static access key; falls back to the default credential chain when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    /// Endpoint override, e.g. a DynamoDB Local URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl DatasourceConfig {
    /// Config for a region using the default credential chain
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            endpoint: None,
        }
    }

    /// Use static credentials
    pub fn with_credentials(mut self, access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Point the client at a different endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

impl fmt::Debug for DatasourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasourceConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<redacted>"))
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// One action invocation as configured by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfiguration {
    /// Registered action name, e.g. `getItem`
    #[serde(default)]
    pub action: Option<String>,

    /// Raw parameter payload, expected to be JSON
    #[serde(default)]
    pub body: String,
}

impl ActionConfiguration {
    pub fn new(action: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            body: body.into(),
        }
    }
}

/// Successful result of one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    pub output: Value,
}

impl ExecutionOutput {
    pub fn new(output: Value) -> Self {
        Self { output }
    }
}

/// Kind of schema object reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableType {
    Table,
}

/// Column descriptor; DynamoDB tables are reported without columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// Minimal schema descriptor for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    #[serde(rename = "type")]
    pub table_type: TableType,
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            table_type: TableType::Table,
            name: name.into(),
            columns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub tables: Vec<Table>,
}

/// Metadata returned to the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceMetadata {
    pub db_schema: DatabaseSchema,
}
