// Entity storage: one interface, a PostgreSQL and an in-memory backend.
// Both run every insert through `contract::verify` first and enforce the
// same referential, uniqueness, cascade and soft-orphan rules.

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::{Entity, LeadMagnet};

#[derive(Debug, Clone, Serialize)]
pub struct StoreHealth {
    pub backend: &'static str,
    pub is_healthy: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    /// Validate and persist; server-assigned columns are filled in
    async fn insert<E: Entity>(&self, new: E::Insert) -> Result<E, StoreError>;

    async fn find<E: Entity>(&self, id: i32) -> Result<Option<E>, StoreError>;

    async fn get<E: Entity>(&self, id: i32) -> Result<E, StoreError> {
        self.find::<E>(id).await?.ok_or(StoreError::NotFound {
            entity: E::DESCRIPTOR.table,
            id,
        })
    }

    /// All rows in id order
    async fn list<E: Entity>(&self) -> Result<Vec<E>, StoreError>;

    /// Rows whose owner column equals `owner_id`, sorted by the
    /// descriptor's order column, then id
    async fn list_by_owner<E: Entity>(&self, owner_id: i32) -> Result<Vec<E>, StoreError>;

    /// Delete one row, applying cascade and set-null to its dependents
    async fn delete<E: Entity>(&self, id: i32) -> Result<(), StoreError>;

    /// Increment a lead magnet's download counter by one
    async fn record_lead_magnet_download(&self, id: i32) -> Result<LeadMagnet, StoreError>;

    async fn health_check(&self) -> StoreHealth;
}
