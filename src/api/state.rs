use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    facade::{DatasourcePlugin, ExecutionFacade},
    registry::ActionRegistry,
    Context,
};

/// Shared application state
pub struct ApiState {
    /// Time when the service started
    startup_time: Instant,
    /// Application context
    pub context: Arc<Context>,
    /// Integration the endpoints delegate to
    pub plugin: Arc<dyn DatasourcePlugin>,
    /// Actions the plugin accepts, for listing
    pub registry: ActionRegistry,
}

impl ApiState {
    /// State backed by the SDK connection provider
    pub fn new(context: Arc<Context>) -> Self {
        let facade = ExecutionFacade::from_context(&context);
        let registry = facade.dispatcher().registry().clone();
        Self::with_plugin(context, Arc::new(facade), registry)
    }

    /// State around an already assembled plugin
    pub fn with_plugin(context: Arc<Context>, plugin: Arc<dyn DatasourcePlugin>, registry: ActionRegistry) -> Self {
        Self {
            startup_time: Instant::now(),
            context,
            plugin,
            registry,
        }
    }

    /// Get the uptime of the service
    pub fn uptime(&self) -> Duration {
        self.startup_time.elapsed()
    }
}
