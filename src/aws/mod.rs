use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_dynamodb::{config::Credentials, Client as DynamoDbClient};
use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use crate::{
    error::{Error, Result},
    types::DatasourceConfig,
    Context,
};

pub mod attribute;
pub mod dynamodb;
pub mod operations;

pub use dynamodb::DynamoDbHandle;

/// Source of connection handles for a datasource
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Get a handle for `config`, building one if needed
    async fn acquire(&self, config: &DatasourceConfig) -> Result<Arc<dyn DynamoDbHandle>>;

    /// Forget any cached handle for `config`
    fn invalidate(&self, config: &DatasourceConfig);
}

/// Stable identity of a datasource config: SHA-256 over its canonical JSON
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigKey(String);

impl ConfigKey {
    pub fn of(config: &DatasourceConfig) -> Result<Self> {
        let canonical = serde_json::to_vec(config)?;
        Ok(Self(hex::encode(Sha256::digest(&canonical))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

type HandleCell = Arc<OnceCell<Arc<dyn DynamoDbHandle>>>;

/// Builds SDK clients and caches them per datasource, least recently used first out
pub struct SdkConnectionProvider {
    context: Context,
    cache: Mutex<LruCache<ConfigKey, HandleCell>>,
}

impl SdkConnectionProvider {
    pub fn new(context: Context) -> Self {
        let capacity = NonZeroUsize::new(context.config.max_cached_connections).unwrap_or(NonZeroUsize::MIN);
        Self {
            context,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached datasource handles
    pub fn cached(&self) -> usize {
        self.cache().len()
    }

    fn cache(&self) -> MutexGuard<'_, LruCache<ConfigKey, HandleCell>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cell for `key`, created empty on a miss
    fn cell_for(&self, key: &ConfigKey) -> HandleCell {
        let mut cache = self.cache();
        if let Some(cell) = cache.get(key) {
            return cell.clone();
        }
        let cell = HandleCell::default();
        if let Some((evicted, _)) = cache.push(key.clone(), cell.clone()) {
            debug!(key = evicted.as_str(), "evicted least recently used DynamoDB connection");
        }
        cell
    }

    /// Drop `cell` unless another acquire already replaced it
    fn forget_cell(&self, key: &ConfigKey, cell: &HandleCell) {
        let mut cache = self.cache();
        if cache.peek(key).map_or(false, |current| Arc::ptr_eq(current, cell)) {
            cache.pop(key);
        }
    }

    /// Assemble credentials and client configuration for one datasource
    pub async fn build_client(&self, config: &DatasourceConfig) -> Result<DynamoDbClient> {
        validate_region(&config.region)?;
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .map(validate_endpoint)
            .transpose()?;
        let credentials = static_credentials(config)?;

        let gateway = &self.context.config;
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(gateway.max_attempts.max(1)))
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(gateway.connect_timeout())
                    .build(),
            );
        if let Some(credentials) = credentials {
            loader = loader.credentials_provider(credentials);
        }
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let shared_config = loader.load().await;
        debug!(region = %config.region, "built DynamoDB client");
        Ok(DynamoDbClient::new(&shared_config))
    }
}

#[async_trait]
impl ConnectionProvider for SdkConnectionProvider {
    async fn acquire(&self, config: &DatasourceConfig) -> Result<Arc<dyn DynamoDbHandle>> {
        if !self.context.config.cache_connections {
            let client = self.build_client(config).await?;
            return Ok(Arc::new(client));
        }

        let key = ConfigKey::of(config)?;
        // The cell is cloned out so the cache lock is not held across the await
        let cell = self.cell_for(&key);
        let built = cell
            .get_or_try_init(|| async {
                let client = self.build_client(config).await?;
                Ok::<Arc<dyn DynamoDbHandle>, Error>(Arc::new(client))
            })
            .await;
        match built {
            Ok(handle) => Ok(handle.clone()),
            Err(err) => {
                self.forget_cell(&key, &cell);
                Err(err)
            }
        }
    }

    fn invalidate(&self, config: &DatasourceConfig) {
        if let Ok(key) = ConfigKey::of(config) {
            if self.cache().pop(&key).is_some() {
                info!(region = %config.region, "dropped cached DynamoDB connection");
            }
        }
    }
}

fn validate_region(region: &str) -> Result<()> {
    let valid = !region.is_empty()
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::Connection(format!("Invalid AWS region '{}'", region)))
    }
}

fn validate_endpoint(endpoint: &str) -> Result<String> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::Connection(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::Connection(format!(
            "Invalid endpoint '{}': expected an http(s) URL",
            endpoint
        )));
    }
    Ok(endpoint.to_string())
}

/// Static credentials when both halves are set; `None` selects the default chain
fn static_credentials(config: &DatasourceConfig) -> Result<Option<Credentials>> {
    let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
    match (non_empty(&config.access_key_id), non_empty(&config.secret_access_key)) {
        (Some(access_key_id), Some(secret_access_key)) => Ok(Some(Credentials::new(
            access_key_id,
            secret_access_key,
            non_empty(&config.session_token),
            None,
            "dynamo-gateway",
        ))),
        (None, None) => Ok(None),
        _ => Err(Error::Connection(
            "accessKeyId and secretAccessKey must be provided together".to_string(),
        )),
    }
}
