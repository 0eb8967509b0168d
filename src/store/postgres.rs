use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{debug, info};

use super::{EntityStore, StoreError, StoreHealth};
use crate::contract;
use crate::db::{check_diesel_health, DieselPool};
use crate::models::{Entity, LeadMagnet};
use crate::schema::lead_magnets;

/// PostgreSQL backend. Foreign keys, unique constraints and ON DELETE
/// actions come from the provisioned schema; violations surface as
/// `StoreError::Referential` / `StoreError::Constraint`.
#[derive(Clone)]
pub struct PgStore {
    pool: DieselPool,
}

impl PgStore {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DieselPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn insert<E: Entity>(&self, new: E::Insert) -> Result<E, StoreError> {
        let new = contract::verify::<E>(&new)?;
        let mut conn = self.pool.get().await?;

        let row = E::pg_insert(&mut conn, &new).await?;
        debug!("[STORE] Inserted {} {}", E::DESCRIPTOR.table, row.id());
        Ok(row)
    }

    async fn find<E: Entity>(&self, id: i32) -> Result<Option<E>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(E::pg_find(&mut conn, id).await?)
    }

    async fn list<E: Entity>(&self) -> Result<Vec<E>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(E::pg_list(&mut conn).await?)
    }

    async fn list_by_owner<E: Entity>(&self, owner_id: i32) -> Result<Vec<E>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(E::pg_list_by_owner(&mut conn, owner_id).await?)
    }

    async fn delete<E: Entity>(&self, id: i32) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;

        match E::pg_delete(&mut conn, id).await? {
            0 => Err(StoreError::NotFound {
                entity: E::DESCRIPTOR.table,
                id,
            }),
            _ => {
                info!("[STORE] Deleted {} {}", E::DESCRIPTOR.table, id);
                Ok(())
            },
        }
    }

    async fn record_lead_magnet_download(&self, id: i32) -> Result<LeadMagnet, StoreError> {
        let mut conn = self.pool.get().await?;

        // Incremented in SQL; concurrent downloads each count
        diesel::update(lead_magnets::table.find(id))
            .set((
                lead_magnets::downloads.eq(lead_magnets::downloads + 1),
                lead_magnets::updated_at.eq(Utc::now()),
            ))
            .returning(LeadMagnet::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?
            .ok_or(StoreError::NotFound {
                entity: "lead_magnets",
                id,
            })
    }

    async fn health_check(&self) -> StoreHealth {
        let health = check_diesel_health(&self.pool).await;
        StoreHealth {
            backend: "postgres",
            is_healthy: health.is_healthy,
            latency_ms: health.latency_ms,
            error: health.error,
        }
    }
}
