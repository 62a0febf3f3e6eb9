//! DynamoDB Gateway
//!
//! A datasource integration that lets a plugin host run named DynamoDB
//! operations with parameters supplied as raw JSON text. Action names are
//! resolved against a closed registry before anything reaches the client.

pub mod api;
pub mod aws;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod facade;
pub mod mock;
pub mod normalizer;
pub mod registry;
pub mod types;

pub use crate::{
    config::GatewayConfig,
    context::Context,
    error::{Error, FailureClass, IntegrationError, Result},
};

pub use aws::{ConnectionProvider, DynamoDbHandle, SdkConnectionProvider};
pub use dispatcher::ActionDispatcher;
pub use facade::{DatasourcePlugin, ExecutionFacade};
pub use normalizer::ParsedParams;
pub use registry::{Action, ActionKind, ActionRegistry, ActionSpec};

/// Re-export common types
pub use types::{ActionConfiguration, DatasourceConfig, DatasourceMetadata, ExecutionOutput, Table};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
