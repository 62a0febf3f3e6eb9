//! JSON-over-HTTP surface for hosts that run the gateway out of process.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;

/// Create the API router
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/actions", get(handlers::list_actions))
        .route("/execute", post(handlers::execute))
        .route("/metadata", post(handlers::metadata))
        .route("/test", post(handlers::test_connection))
        .route("/describe", post(handlers::describe))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
