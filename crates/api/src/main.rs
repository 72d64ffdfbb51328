use std::sync::Arc;

use anyhow::Context;
use tenderflow_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tenderflow_observability::init();

    let config = AppConfig::from_env()?;
    let services = tenderflow_api::app::services::build_services(&config).await?;
    tracing::info!(backend = services.backend(), "services ready");

    let app = tenderflow_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(&config.server_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server_address))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
