use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::contract::ValidationError;

/// Failures of an [`EntityStore`](super::EntityStore) operation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A foreign key points at a row that does not exist
    #[error("Referential integrity violation: {0}")]
    Referential(String),

    /// A unique constraint rejected the row
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<DieselError> for StoreError {
    fn from(error: DieselError) -> Self {
        match error {
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::Referential(match info.constraint_name() {
                    Some(name) => format!("{} ({})", info.message(), name),
                    None => info.message().to_string(),
                })
            },
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Constraint(
                    info.constraint_name()
                        .map(str::to_string)
                        .unwrap_or_else(|| info.message().to_string()),
                )
            },
            DieselError::SerializationError(e) | DieselError::DeserializationError(e) => {
                StoreError::Serialization(e.to_string())
            },
            other => StoreError::Database(other.to_string()),
        }
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for StoreError {
    fn from(error: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        StoreError::Pool(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Serialization(error.to_string())
    }
}
