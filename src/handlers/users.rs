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
    handlers::entities::json_body,
    models::{User, UserProfile},
    store::EntityStore,
    utils::{password::hash_password, service_error::ServiceError},
};

/// POST /v1/users
///
/// The plaintext password is validated like any other field, then
/// replaced by its Argon2id hash before it reaches storage.
pub async fn create_user<S: EntityStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ServiceError> {
    let body = json_body(payload)?;
    let mut new = contract::parse::<User>(&body)?;

    let plaintext = std::mem::take(&mut new.password);
    new.password = tokio::task::spawn_blocking(move || hash_password(&plaintext))
        .await
        .map_err(|e| ServiceError::Internal(format!("password hashing task failed: {}", e)))??;

    let user = state.store.insert::<User>(new).await?;
    info!("[API] Registered user {} ({})", user.id, user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /v1/users/{id}/profile
pub async fn get_profile<S: EntityStore>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserProfile>, ServiceError> {
    state.store.get::<User>(user_id).await?;

    state
        .store
        .list_by_owner::<UserProfile>(user_id)
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound(format!("user {} has no profile", user_id)))
}
