use async_trait::async_trait;
use serde_json::Value;

use crate::{error::Result, normalizer::ParsedParams, registry::Action};

use super::operations;

/// A connection handle the dispatcher can invoke actions on.
///
/// The real implementation is the SDK client; tests swap in
/// [`crate::mock::MockHandle`].
#[async_trait]
pub trait DynamoDbHandle: Send + Sync {
    async fn call(&self, action: Action, params: ParsedParams) -> Result<Value>;
}

#[async_trait]
impl DynamoDbHandle for aws_sdk_dynamodb::Client {
    async fn call(&self, action: Action, params: ParsedParams) -> Result<Value> {
        operations::invoke(self, action, params.into_object()?).await
    }
}
