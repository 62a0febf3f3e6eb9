use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Gateway-wide settings shared by every datasource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address the HTTP surface binds to
    pub bind_addr: String,

    /// Maximum attempts for the SDK's standard retry mode
    pub max_attempts: u32,

    /// Connection timeout in seconds
    pub connect_timeout: u64,

    /// Optional per-operation timeout in seconds; none means the SDK decides
    pub operation_timeout: Option<u64>,

    /// Reuse clients across requests for the same datasource
    pub cache_connections: bool,

    /// Most datasource clients kept at once; the least recently used is dropped first
    pub max_cached_connections: usize,
}

impl GatewayConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            bind_addr: env::var("GATEWAY_BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_attempts: parse_var("GATEWAY_MAX_ATTEMPTS")?.unwrap_or(defaults.max_attempts),
            connect_timeout: parse_var("GATEWAY_CONNECT_TIMEOUT_SECS")?.unwrap_or(defaults.connect_timeout),
            operation_timeout: parse_var("GATEWAY_OPERATION_TIMEOUT_SECS")?,
            cache_connections: parse_var("GATEWAY_CACHE_CONNECTIONS")?.unwrap_or(defaults.cache_connections),
            max_cached_connections: parse_var("GATEWAY_MAX_CACHED_CONNECTIONS")?
                .unwrap_or(defaults.max_cached_connections),
        })
    }

    /// Create a new configuration for testing
    pub fn for_testing() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            max_attempts: 1,
            connect_timeout: 2,
            operation_timeout: Some(10),
            cache_connections: true,
            max_cached_connections: 16,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout.map(Duration::from_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            max_attempts: 3,
            connect_timeout: 30,
            operation_timeout: None,
            cache_connections: true,
            max_cached_connections: 64,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Configuration(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(None),
    }
}
