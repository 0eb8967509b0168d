// Dashboard list views and the lead magnet download counter

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;

use crate::{
    app::AppState,
    models::{EmailContact, Lead, LeadMagnet},
    services::dashboard::{summarize_leads, ContactQuery, LeadQuery, LeadSummary},
    store::EntityStore,
    utils::service_error::ServiceError,
};

/// GET /v1/leads?status=&funnel_id=&search=&sort=
pub async fn query_leads<S: EntityStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<LeadQuery>,
) -> Result<Json<Vec<Lead>>, ServiceError> {
    let leads = state.store.list::<Lead>().await?;
    let matched = query.apply(leads);
    debug!("[API] Lead query {:?} matched {}", query, matched.len());
    Ok(Json(matched))
}

/// GET /v1/leads/summary
pub async fn lead_summary<S: EntityStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<LeadQuery>,
) -> Result<Json<LeadSummary>, ServiceError> {
    let leads = query.apply(state.store.list::<Lead>().await?);
    Ok(Json(summarize_leads(&leads)))
}

/// GET /v1/email-contacts?status=&tag=&search=
pub async fn query_contacts<S: EntityStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<ContactQuery>,
) -> Result<Json<Vec<EmailContact>>, ServiceError> {
    let contacts = state.store.list::<EmailContact>().await?;
    Ok(Json(query.apply(contacts)))
}

/// POST /v1/lead-magnets/{id}/downloads
pub async fn record_download<S: EntityStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Json<LeadMagnet>, ServiceError> {
    Ok(Json(state.store.record_lead_magnet_download(id).await?))
}
