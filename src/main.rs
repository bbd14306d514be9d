use std::sync::Arc;

use reelrank::{
    config::Config,
    db::{create_redis_client, Cache},
    routes::{create_router, AppState},
    services::{CatalogSource, JsonFileCatalog},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reelrank::init_tracing();

    let config = Config::from_env()?;

    let source = JsonFileCatalog::new(&config.catalog_path);
    let catalog = source.load().await?;
    tracing::info!(source = source.name(), items = catalog.len(), "Catalog ready");

    let (cache, cache_writer) = match &config.redis_url {
        Some(url) => {
            let (cache, handle) = Cache::new(create_redis_client(url)?).await;
            tracing::info!("Response caching enabled");
            (Some(cache), Some(handle))
        }
        None => {
            tracing::info!("REDIS_URL not set, response caching disabled");
            (None, None)
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, catalog, cache)?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
