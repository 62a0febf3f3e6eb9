use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{debug, info_span, warn, Instrument};

use crate::{
    aws::DynamoDbHandle,
    error::{Error, FailureClass, Result},
    normalizer::ParsedParams,
    registry::{ActionRegistry, ActionSpec},
    types::ExecutionOutput,
    Context,
};

/// Resolves action names and runs them against a connection handle
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    registry: ActionRegistry,
    operation_timeout: Option<Duration>,
}

impl ActionDispatcher {
    pub fn new(registry: ActionRegistry) -> Self {
        Self {
            registry,
            operation_timeout: None,
        }
    }

    /// Dispatcher with the full registry and the configured timeout
    pub fn from_context(context: &Context) -> Self {
        Self::new(ActionRegistry::default()).with_timeout(context.config.operation_timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Look up a requested action name
    pub fn resolve(&self, name: Option<&str>) -> Result<ActionSpec> {
        let name = name.filter(|name| !name.is_empty()).ok_or(Error::MissingAction)?;
        self.registry
            .resolve(name)
            .copied()
            .ok_or_else(|| Error::UnknownAction(name.to_string()))
    }

    /// Resolve `name` and invoke it on `handle`.
    ///
    /// Nothing reaches the handle unless the name is registered.
    pub async fn invoke(
        &self,
        handle: &dyn DynamoDbHandle,
        name: Option<&str>,
        params: ParsedParams,
    ) -> Result<ExecutionOutput> {
        let spec = self.resolve(name)?;
        self.call(handle, spec, params).await
    }

    /// Invoke an already resolved action; produces exactly one outcome
    pub async fn call(
        &self,
        handle: &dyn DynamoDbHandle,
        spec: ActionSpec,
        params: ParsedParams,
    ) -> Result<ExecutionOutput> {
        let span = info_span!("dispatch", action = spec.name);
        let started = Instant::now();

        let result = async {
            let call = AssertUnwindSafe(handle.call(spec.action, params)).catch_unwind();
            let settled = match self.operation_timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(settled) => settled,
                    Err(_) => {
                        return Err(Error::RemoteOperation {
                            message: format!("{} timed out after {:?}", spec.name, limit),
                            class: FailureClass::Connection,
                        })
                    }
                },
                None => call.await,
            };
            match settled {
                Ok(result) => result,
                Err(panic) => Err(Error::remote(panic_message(panic))),
            }
        }
        .instrument(span.clone())
        .await;

        let elapsed = started.elapsed();
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::increment_counter!("dynamo_gateway_dispatch_total", "action" => spec.name, "outcome" => outcome);
        metrics::histogram!("dynamo_gateway_dispatch_seconds", elapsed.as_secs_f64(), "action" => spec.name);

        span.in_scope(|| match &result {
            Ok(_) => debug!(elapsed_ms = elapsed.as_millis() as u64, "action completed"),
            Err(e) => warn!(elapsed_ms = elapsed.as_millis() as u64, error = %e, "action failed"),
        });

        result.map(ExecutionOutput::new)
    }
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new(ActionRegistry::default())
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "operation panicked".to_string()
    }
}
