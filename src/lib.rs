// Library exports for the Convertly backend core

pub mod app;
pub mod app_config;
pub mod contract;
pub mod db;
pub mod descriptor;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, StoreBackend, CONFIG};
pub use contract::{parse, validate_payload, verify, ValidationError};
pub use db::DieselPool;
pub use descriptor::{catalog, find_entity, EntityDescriptor};
pub use middleware::CorsPolicy;
pub use models::Entity;
pub use services::draft_library::{DraftLibrary, EmailDraft};
pub use store::{EntityStore, MemoryStore, PgStore, StoreError};
pub use utils::service_error::ServiceError;

/// Every route, wrapped in CORS and request tracing
pub fn build_router<S: EntityStore>(state: AppState<S>, cors: CorsPolicy) -> Router {
    Router::new()
        .route(
            "/health",
            axum::routing::get(handlers::health::health_check::<S>),
        )
        .merge(handlers::entity_routes::<S>())
        .merge(handlers::traversal_routes::<S>())
        .merge(handlers::draft_routes::<S>())
        .layer(axum::middleware::from_fn_with_state(
            Arc::new(cors),
            middleware::dynamic_cors_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect to PostgreSQL and provision the schema when enabled
pub async fn initialize_pg_store() -> Result<PgStore, Box<dyn std::error::Error + Send + Sync>> {
    use tracing::info;

    info!("Initializing database pool...");
    let pool = db::create_diesel_pool(db::DieselDatabaseConfig::default()).await?;

    if migrations::should_run_migrations() {
        info!("Running embedded migrations...");
        migrations::run_migrations(&pool, migrations::MigrationConfig::default())
            .await
            .map_err(|e| format!("Migration failed: {}", e))?;
    }

    Ok(PgStore::new(pool))
}

/// Draft library stored at `DRAFT_LIBRARY_PATH`
pub fn draft_library_from_config() -> DraftLibrary {
    let path = app_config::config().draft_library_path.clone();
    DraftLibrary::new(Arc::new(repository::JsonFileRepository::<EmailDraft>::new(path)))
}
