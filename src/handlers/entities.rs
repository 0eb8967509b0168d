// Generic create/list/get/delete handlers, instantiated once per entity

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::{
    app::AppState,
    contract,
    models::Entity,
    store::EntityStore,
    utils::service_error::ServiceError,
};

/// Unwrap a JSON body, reporting malformed input in the API error shape
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ServiceError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))
}

/// POST /v1/{collection}
pub async fn create<S: EntityStore, E: Entity>(
    State(state): State<AppState<S>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<E>), ServiceError> {
    let body = json_body(payload)?;
    let new = contract::parse::<E>(&body)?;

    let row = state.store.insert::<E>(new).await?;
    info!("[API] Created {} {}", E::DESCRIPTOR.table, row.id());
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /v1/{collection}
pub async fn list<S: EntityStore, E: Entity>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<E>>, ServiceError> {
    Ok(Json(state.store.list::<E>().await?))
}

/// GET /v1/{collection}/{id}
pub async fn fetch<S: EntityStore, E: Entity>(
    State(state): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Json<E>, ServiceError> {
    Ok(Json(state.store.get::<E>(id).await?))
}

/// DELETE /v1/{collection}/{id}
pub async fn remove<S: EntityStore, E: Entity>(
    State(state): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.store.delete::<E>(id).await?;
    info!("[API] Deleted {} {}", E::DESCRIPTOR.table, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Children of parent `P` whose owner column is `id`; 404 when the parent is missing
pub async fn owned<S: EntityStore, P: Entity, E: Entity>(
    State(state): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<E>>, ServiceError> {
    state.store.get::<P>(id).await?;
    Ok(Json(state.store.list_by_owner::<E>(id).await?))
}
