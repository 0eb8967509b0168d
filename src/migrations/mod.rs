// Schema provisioning for the Convertly backend
// Tables are rendered from the entity descriptors and embedded in the binary

pub mod ddl;

use crate::db::DieselPool;
use crate::descriptor::catalog;
use diesel::sql_types::Text;
use diesel::QueryableByName;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use std::error::Error;
use tracing::{debug, error, info, warn};

/// Configuration for migration execution
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub skip_schema: bool,
    pub environment: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        let config = crate::app_config::config();

        Self {
            skip_schema: false,
            environment: config.environment.to_string(),
        }
    }
}

/// Provision every table, returning how many were missing beforehand
pub async fn run_migrations(
    pool: &DieselPool,
    config: MigrationConfig,
) -> Result<usize, Box<dyn Error + Send + Sync>> {
    info!(
        "[MIGRATIONS] Starting migration process for environment: {}",
        config.environment
    );

    if config.skip_schema {
        info!("[MIGRATIONS] Skipping schema provisioning (disabled in config)");
        return Ok(0);
    }

    let before = check_migration_status(pool).await?;
    if before.is_up_to_date() {
        info!("[MIGRATIONS] ✓ Schema up to date");
        return Ok(0);
    }
    info!(
        "[MIGRATIONS] Creating {} missing tables: {}",
        before.missing.len(),
        before.missing.join(", ")
    );

    let script = ddl::schema_statements().join(";\n") + ";";
    debug!("[MIGRATIONS] Schema script:\n{}", script);

    let mut conn = pool.get().await?;
    // A multi-statement simple query runs as a single implicit transaction
    if let Err(e) = conn.batch_execute(&script).await {
        error!("[MIGRATIONS] ✗ Schema provisioning failed: {}", e);
        return Err(format!("Schema provisioning failed: {}", e).into());
    }
    drop(conn);

    let after = check_migration_status(pool).await?;
    if !after.is_up_to_date() {
        warn!(
            "[MIGRATIONS] Tables still missing after provisioning: {}",
            after.missing.join(", ")
        );
        return Err(format!("Tables still missing: {}", after.missing.join(", ")).into());
    }

    info!(
        "[MIGRATIONS] ✓ Migration process completed - created {} tables",
        before.missing.len()
    );
    Ok(before.missing.len())
}

#[derive(QueryableByName)]
struct TableRow {
    #[diesel(sql_type = Text)]
    table_name: String,
}

/// Which catalog tables exist in the current schema
#[derive(Debug)]
pub struct MigrationStatus {
    pub present: Vec<&'static str>,
    pub missing: Vec<&'static str>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.missing.is_empty()
    }
}

pub async fn check_migration_status(
    pool: &DieselPool,
) -> Result<MigrationStatus, Box<dyn Error + Send + Sync>> {
    let mut conn = pool.get().await?;
    let rows: Vec<TableRow> = diesel::sql_query(
        "SELECT table_name::text AS table_name FROM information_schema.tables \
         WHERE table_schema = current_schema()",
    )
    .load(&mut conn)
    .await?;

    let (present, missing) = catalog()
        .iter()
        .map(|entity| entity.table)
        .partition(|table| rows.iter().any(|row| row.table_name == *table));

    Ok(MigrationStatus { present, missing })
}

/// Drop every table; refused in production
pub async fn drop_schema(pool: &DieselPool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = crate::app_config::config();
    if config.is_production() {
        return Err("Dropping the schema is disabled in production for safety".into());
    }

    warn!(
        "[MIGRATIONS] Dropping all tables (environment: {})",
        config.environment
    );
    let script = ddl::drop_statements().join(";\n") + ";";
    let mut conn = pool.get().await?;
    conn.batch_execute(&script).await?;
    Ok(())
}

/// Check if migrations should run based on environment variables
pub fn should_run_migrations() -> bool {
    !crate::app_config::config().disable_embedded_migrations
}
