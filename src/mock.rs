//! Scripted stand-ins for the connection layer, used by tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};

use crate::{
    aws::{ConnectionProvider, DynamoDbHandle},
    error::{Error, FailureClass, Result},
    normalizer::ParsedParams,
    registry::Action,
    types::DatasourceConfig,
};

#[derive(Debug, Clone)]
enum Scripted {
    Respond(Value),
    Fail { message: String, class: FailureClass },
    Panic(String),
}

/// Handle that answers each action with a scripted response.
///
/// Unscripted actions succeed with `{}`.
#[derive(Debug, Default)]
pub struct MockHandle {
    script: DashMap<Action, Scripted>,
    calls: Mutex<Vec<(Action, ParsedParams)>>,
    delay: Option<Duration>,
}

impl MockHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, action: Action, output: Value) -> Self {
        self.script.insert(action, Scripted::Respond(output));
        self
    }

    pub fn fail(self, action: Action, message: &str, class: FailureClass) -> Self {
        self.script.insert(
            action,
            Scripted::Fail {
                message: message.to_string(),
                class,
            },
        );
        self
    }

    pub fn panic_on(self, action: Action, message: &str) -> Self {
        self.script.insert(action, Scripted::Panic(message.to_string()));
        self
    }

    /// Respond to `listTables` with the given names
    pub fn with_tables(self, names: &[&str]) -> Self {
        self.respond(Action::ListTables, json!({ "TableNames": names }))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn calls(&self) -> Vec<(Action, ParsedParams)> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl DynamoDbHandle for MockHandle {
    async fn call(&self, action: Action, params: ParsedParams) -> Result<Value> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((action, params));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.get(&action).map(|entry| entry.value().clone());
        match scripted {
            Some(Scripted::Respond(output)) => Ok(output),
            Some(Scripted::Fail { message, class }) => Err(Error::RemoteOperation { message, class }),
            Some(Scripted::Panic(message)) => panic!("{}", message),
            None => Ok(json!({})),
        }
    }
}

/// Provider that always hands out the same [`MockHandle`]
pub struct MockProvider {
    handle: Arc<MockHandle>,
    acquire_error: Option<String>,
    acquisitions: AtomicUsize,
    invalidations: AtomicUsize,
}

impl MockProvider {
    pub fn new(handle: MockHandle) -> Self {
        Self {
            handle: Arc::new(handle),
            acquire_error: None,
            acquisitions: AtomicUsize::new(0),
            invalidations: AtomicUsize::new(0),
        }
    }

    /// Provider whose every acquire fails with a connection error
    pub fn failing(message: &str) -> Self {
        Self {
            acquire_error: Some(message.to_string()),
            ..Self::new(MockHandle::new())
        }
    }

    pub fn handle(&self) -> &MockHandle {
        &self.handle
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionProvider for MockProvider {
    async fn acquire(&self, _config: &DatasourceConfig) -> Result<Arc<dyn DynamoDbHandle>> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        match &self.acquire_error {
            Some(message) => Err(Error::Connection(message.clone())),
            None => Ok(self.handle.clone()),
        }
    }

    fn invalidate(&self, _config: &DatasourceConfig) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}
