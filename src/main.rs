use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dynamo_gateway::{
    api::{self, ApiState},
    Context, GatewayConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let context = Arc::new(Context::new(config));

    let app = api::create_router(Arc::new(ApiState::new(context)));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, version = dynamo_gateway::VERSION, "DynamoDB gateway listening");
    axum::serve(listener, app).await?;

    Ok(())
}
