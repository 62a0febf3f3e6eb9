use std::sync::Arc;
use crate::config::GatewayConfig;

/// Application context containing shared gateway configuration
#[derive(Clone)]
pub struct Context {
    /// Shared configuration
    pub config: Arc<GatewayConfig>,
}

impl Context {
    /// Create a new Context with the given configuration
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(GatewayConfig::default())
    }
}
