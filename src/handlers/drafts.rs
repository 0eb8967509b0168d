// Email draft library endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::info;

use crate::{
    app::AppState,
    handlers::entities::json_body,
    models::EmailTemplate,
    services::draft_library::{DraftInput, EmailDraft},
    store::EntityStore,
    utils::service_error::ServiceError,
};

/// Typed request body, with every failure in the API error shape
fn request_body<T: DeserializeOwned>(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<T, ServiceError> {
    serde_json::from_value(json_body(payload)?)
        .map_err(|e| ServiceError::BadRequest(format!("Invalid request body: {}", e)))
}

pub async fn list_drafts<S: EntityStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<EmailDraft>>, ServiceError> {
    Ok(Json(state.drafts.list().await?))
}

pub async fn get_draft<S: EntityStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<u32>,
) -> Result<Json<EmailDraft>, ServiceError> {
    Ok(Json(state.drafts.get(id).await?))
}

pub async fn create_draft<S: EntityStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<EmailDraft>), ServiceError> {
    let input: DraftInput = request_body(payload)?;
    let draft = state.drafts.save(None, input).await?;
    Ok((StatusCode::CREATED, Json(draft)))
}

pub async fn update_draft<S: EntityStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<u32>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<EmailDraft>, ServiceError> {
    let input: DraftInput = request_body(payload)?;
    Ok(Json(state.drafts.save(Some(id), input).await?))
}

pub async fn delete_draft<S: EntityStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<u32>,
) -> Result<StatusCode, ServiceError> {
    state.drafts.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct PromoteRequest {
    pub user_id: Option<i32>,
}

/// POST /v1/email-drafts/{id}/promote
pub async fn promote_draft<S: EntityStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<u32>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<EmailTemplate>), ServiceError> {
    let request: PromoteRequest = request_body(payload)?;
    let new = state.drafts.to_template(id, request.user_id).await?;
    let template = state.store.insert::<EmailTemplate>(new).await?;

    info!("[API] Promoted draft {} to email template {}", id, template.id);
    Ok((StatusCode::CREATED, Json(template)))
}
