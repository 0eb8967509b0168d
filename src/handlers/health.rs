use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{app::AppState, store::EntityStore};

/// GET /health
pub async fn health_check<S: EntityStore>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<Value>) {
    let store = state.store.health_check().await;
    let status = if store.is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store.is_healthy { "healthy" } else { "degraded" },
        "service": "convertly-core",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "components": {
            "store": {
                "backend": store.backend,
                "status": if store.is_healthy { "healthy" } else { "unhealthy" },
                "latency_ms": store.latency_ms,
                "error": store.error,
            }
        }
    });

    (status, Json(response))
}
