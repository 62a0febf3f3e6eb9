use serde::{Deserialize, Serialize};

use crate::types::{ActionConfiguration, DatasourceConfig};

/// Body of `POST /execute`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub datasource: DatasourceConfig,
    pub action_configuration: ActionConfiguration,
}

/// Body of `POST /metadata` and `POST /test`
#[derive(Debug, Clone, Deserialize)]
pub struct DatasourceRequest {
    pub datasource: DatasourceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeResponse {
    pub request: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionsResponse {
    pub actions: Vec<String>,
    pub dynamic_properties: Vec<String>,
    pub escape_string_properties: Vec<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall status
    pub status: String,
    /// Crate version
    pub version: String,
    /// Uptime in seconds
    pub uptime: u64,
}
