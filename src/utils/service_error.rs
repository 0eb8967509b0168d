// Error type returned by every HTTP handler
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::contract::ValidationError;
use crate::services::draft_library::DraftError;
use crate::store::StoreError;
use crate::utils::password::PasswordError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Referential(String),

    #[error("{0}")]
    Constraint(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::Referential(_) => "referential",
            ServiceError::Constraint(_) => "constraint",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Referential(_) | ServiceError::Constraint(_) => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        let fields = match &self {
            ServiceError::Validation(report) => json!(report.fields),
            _ => Value::Object(Default::default()),
        };
        if let ServiceError::Internal(detail) = &self {
            // Details stay in the logs
            error!("[API] Internal error: {}", detail);
        }

        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
            "fields": fields,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Validation(report) => ServiceError::Validation(report),
            StoreError::Referential(msg) => ServiceError::Referential(msg),
            StoreError::Constraint(msg) => ServiceError::Constraint(msg),
            e @ StoreError::NotFound { .. } => ServiceError::NotFound(e.to_string()),
            e => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(error: PasswordError) -> Self {
        match error {
            PasswordError::Empty => ServiceError::BadRequest(error.to_string()),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<DraftError> for ServiceError {
    fn from(error: DraftError) -> Self {
        match error {
            DraftError::NotFound(_) => ServiceError::NotFound(error.to_string()),
            DraftError::Invalid(msg) => ServiceError::BadRequest(msg),
            DraftError::Store(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let mut report = ValidationError::new("leads");
        report.add("status", "must be one of: new");
        assert_eq!(
            ServiceError::from(report).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::from(StoreError::Referential("x".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::from(StoreError::NotFound {
                entity: "pages",
                id: 3
            })
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::from(StoreError::Pool("timeout".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_message_is_generic() {
        let error = ServiceError::Internal("connection refused".to_string());
        assert_eq!(error.to_string(), "Internal server error");
    }
}
