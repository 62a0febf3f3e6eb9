use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use uuid::Uuid;

use crate::{
    api::{models::*, ApiResult, ApiState},
    types::{ActionConfiguration, DatasourceMetadata, ExecutionOutput},
};

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Check health status of the API
pub async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.uptime().as_secs(),
    })
}

/// List the registered actions and the host-facing property declarations
pub async fn list_actions(State(state): State<Arc<ApiState>>) -> Json<ActionsResponse> {
    Json(ActionsResponse {
        actions: to_strings(&state.registry.names()),
        dynamic_properties: to_strings(state.plugin.dynamic_properties()),
        escape_string_properties: to_strings(state.plugin.escape_string_properties()),
    })
}

/// Run one action against a datasource
pub async fn execute(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> ApiResult<Json<ExecutionOutput>> {
    let Json(request) = payload?;
    let request_id = Uuid::new_v4();
    tracing::info!(
        %request_id,
        action = request.action_configuration.action.as_deref().unwrap_or(""),
        "execute request"
    );
    let output = state
        .plugin
        .execute(&request.datasource, &request.action_configuration)
        .await?;
    Ok(Json(output))
}

pub async fn metadata(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<DatasourceRequest>, JsonRejection>,
) -> ApiResult<Json<DatasourceMetadata>> {
    let Json(request) = payload?;
    Ok(Json(state.plugin.metadata(&request.datasource).await?))
}

pub async fn test_connection(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<DatasourceRequest>, JsonRejection>,
) -> ApiResult<Json<TestResponse>> {
    let Json(request) = payload?;
    state.plugin.test(&request.datasource).await?;
    Ok(Json(TestResponse {
        status: "ok".to_string(),
    }))
}

/// Render the display summary of an action configuration
pub async fn describe(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<ActionConfiguration>, JsonRejection>,
) -> ApiResult<Json<DescribeResponse>> {
    let Json(action) = payload?;
    Ok(Json(DescribeResponse {
        request: state.plugin.describe_request(&action),
    }))
}
