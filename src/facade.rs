//! Host-facing entry points.
//!
//! The façade wires a [`ConnectionProvider`] and an [`ActionDispatcher`]
//! together for one request at a time and collapses every internal error
//! into an [`IntegrationError`] with a context prefix.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::{
    aws::{ConnectionProvider, DynamoDbHandle, SdkConnectionProvider},
    dispatcher::ActionDispatcher,
    error::{Error, IntegrationError, Result},
    normalizer::{self, ParsedParams},
    registry::Action,
    types::{
        ActionConfiguration, DatabaseSchema, DatasourceConfig, DatasourceMetadata, ExecutionOutput, Table,
    },
    Context,
};

const EXECUTE_CONTEXT: &str = "DynamoDB request failed";
const LIST_TABLES_CONTEXT: &str = "DynamoDB listTables operation failed";

/// Fields of an action configuration that may carry template expressions
pub const DYNAMIC_PROPERTIES: &[&str] = &["action", "body"];

/// Fields that need quote escaping when embedded in generated templates
pub const ESCAPE_STRING_PROPERTIES: &[&str] = &["body"];

lazy_static! {
    static ref CAPITAL: Regex = Regex::new(r"[A-Z]").unwrap();
}

/// Contract between a plugin host and a datasource integration
#[async_trait]
pub trait DatasourcePlugin: Send + Sync {
    /// Run one configured action
    async fn execute(
        &self,
        datasource: &DatasourceConfig,
        action: &ActionConfiguration,
    ) -> std::result::Result<ExecutionOutput, IntegrationError>;

    /// Describe the schema objects the datasource exposes
    async fn metadata(&self, datasource: &DatasourceConfig) -> std::result::Result<DatasourceMetadata, IntegrationError>;

    /// Check that the datasource is reachable with its credentials
    async fn test(&self, datasource: &DatasourceConfig) -> std::result::Result<(), IntegrationError>;

    /// Human readable summary of a request, for display and audit
    fn describe_request(&self, action: &ActionConfiguration) -> String {
        describe_request(action)
    }

    fn dynamic_properties(&self) -> &'static [&'static str] {
        DYNAMIC_PROPERTIES
    }

    fn escape_string_properties(&self) -> &'static [&'static str] {
        ESCAPE_STRING_PROPERTIES
    }
}

/// Orchestrates provider, normalizer and dispatcher for each request
pub struct ExecutionFacade {
    provider: Arc<dyn ConnectionProvider>,
    dispatcher: ActionDispatcher,
}

impl ExecutionFacade {
    pub fn new(provider: Arc<dyn ConnectionProvider>, dispatcher: ActionDispatcher) -> Self {
        Self { provider, dispatcher }
    }

    /// Façade backed by the AWS SDK, configured from `context`
    pub fn from_context(context: &Context) -> Self {
        Self::new(
            Arc::new(SdkConnectionProvider::new(context.clone())),
            ActionDispatcher::from_context(context),
        )
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    async fn run_action(&self, datasource: &DatasourceConfig, action: &ActionConfiguration) -> Result<ExecutionOutput> {
        let handle = self.provider.acquire(datasource).await?;
        let params = normalizer::parse(&action.body);
        let result = self
            .dispatcher
            .invoke(handle.as_ref(), action.action.as_deref(), params)
            .await;
        self.forget_broken_connection(datasource, &result);
        result
    }

    /// Every table name, following `LastEvaluatedTableName` until it is absent or seen before
    async fn list_table_names(&self, datasource: &DatasourceConfig) -> Result<Vec<String>> {
        let handle = self.provider.acquire(datasource).await?;
        let mut names = Vec::new();
        let mut start: Option<String> = None;
        let mut seen = HashSet::new();

        loop {
            let params = match &start {
                Some(name) => json!({ "ExclusiveStartTableName": name }),
                None => json!({}),
            };
            let page = self.list_tables(handle.as_ref(), datasource, params).await?;

            if let Some(page_names) = page.get("TableNames").and_then(Value::as_array) {
                names.extend(page_names.iter().filter_map(Value::as_str).map(str::to_string));
            }
            match page.get("LastEvaluatedTableName").and_then(Value::as_str) {
                Some(next) if seen.insert(next.to_string()) => start = Some(next.to_string()),
                Some(next) => {
                    warn!(token = next, "listTables pagination repeated a token, stopping");
                    break;
                }
                None => break,
            }
        }
        Ok(names)
    }

    async fn list_tables(&self, handle: &dyn DynamoDbHandle, datasource: &DatasourceConfig, params: Value) -> Result<Value> {
        let result = self
            .dispatcher
            .call(handle, Action::ListTables.spec(), ParsedParams::Parsed(params))
            .await;
        self.forget_broken_connection(datasource, &result);
        result.map(|output| output.output)
    }

    fn forget_broken_connection<T>(&self, datasource: &DatasourceConfig, result: &Result<T>) {
        if let Err(err) = result {
            if let Some(class) = err.failure_class().filter(|class| class.invalidates_connection()) {
                warn!(%class, "remote call failed, discarding cached connection");
                self.provider.invalidate(datasource);
            }
        }
    }
}

#[async_trait]
impl DatasourcePlugin for ExecutionFacade {
    #[instrument(skip_all, fields(action = action.action.as_deref().unwrap_or("")))]
    async fn execute(
        &self,
        datasource: &DatasourceConfig,
        action: &ActionConfiguration,
    ) -> std::result::Result<ExecutionOutput, IntegrationError> {
        self.run_action(datasource, action)
            .await
            .map_err(|e| IntegrationError::wrap(EXECUTE_CONTEXT, &e))
    }

    #[instrument(skip_all, fields(region = %datasource.region))]
    async fn metadata(&self, datasource: &DatasourceConfig) -> std::result::Result<DatasourceMetadata, IntegrationError> {
        let names = self
            .list_table_names(datasource)
            .await
            .map_err(|e| Error::Metadata(e.to_string()))
            .map_err(|e| IntegrationError::wrap(LIST_TABLES_CONTEXT, &e))?;

        info!(tables = names.len(), "loaded datasource metadata");
        Ok(DatasourceMetadata {
            db_schema: DatabaseSchema {
                tables: names.into_iter().map(Table::named).collect(),
            },
        })
    }

    #[instrument(skip_all, fields(region = %datasource.region))]
    async fn test(&self, datasource: &DatasourceConfig) -> std::result::Result<(), IntegrationError> {
        let probe = async {
            let handle = self.provider.acquire(datasource).await?;
            self.list_tables(handle.as_ref(), datasource, json!({})).await
        };
        probe
            .await
            .map(|_| ())
            .map_err(|e| Error::Connectivity(e.to_string()))
            .map_err(|e| IntegrationError::wrap(LIST_TABLES_CONTEXT, &e))
    }
}

/// Render `Action: <name>\n\nParams:\n<body>`; the body is shown verbatim
pub fn describe_request(action: &ActionConfiguration) -> String {
    format!(
        "Action: {}\n\nParams:\n{}",
        humanize(action.action.as_deref().unwrap_or("")),
        action.body
    )
}

/// `batchGetItem` -> `Batch Get Item`; every capital starts a word
pub fn humanize(name: &str) -> String {
    CAPITAL
        .replace_all(name, |caps: &Captures| format!(" {}", &caps[0]))
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
