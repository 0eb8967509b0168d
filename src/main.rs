use anyhow::Context;
use convertly_core::{
    app_config, build_router, draft_library_from_config, initialize_pg_store, AppState,
    CorsPolicy, EntityStore, MemoryStore, StoreBackend,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn serve<S: EntityStore>(store: S) -> anyhow::Result<()> {
    let config = app_config::config();
    let state = AppState::new(store, draft_library_from_config());
    let app = build_router(state, CorsPolicy::from_config());

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!("[API] Listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("server error")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before the config is first touched
    dotenv::dotenv().ok();

    let config = app_config::AppConfig::from_env().context("invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Convertly core ({} environment, {:?} store)",
        config.environment, config.store_backend
    );

    match config.store_backend {
        StoreBackend::Postgres => {
            let store = initialize_pg_store()
                .await
                .map_err(|e| anyhow::anyhow!("database initialization failed: {}", e))?;
            serve(store).await
        },
        StoreBackend::Memory => serve(MemoryStore::new()).await,
    }
}
