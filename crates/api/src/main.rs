use std::sync::Arc;

use anyhow::Context;

use shopledger_api::app::{self, services::AppServices};
use shopledger_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopledger_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let services = AppServices::open(&config).await?;
    let app = app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server terminated")?;
    Ok(())
}
