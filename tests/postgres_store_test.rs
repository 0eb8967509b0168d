// EntityStore semantics against PostgreSQL.
// Runs only when DATABASE_URL points at a reachable, disposable database.

mod common;

use common::{sample_payload, with_field};
use convertly_core::db::{create_diesel_pool, DieselDatabaseConfig};
use convertly_core::migrations::{self, MigrationConfig};
use convertly_core::models::*;
use convertly_core::{parse, Entity, EntityStore, PgStore, StoreError};
use serde_json::json;
use serial_test::serial;

/// Fresh schema on the test database, or None to skip
async fn fresh_store() -> Option<PgStore> {
    dotenv::dotenv().ok();
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            eprintln!("DATABASE_URL not set, skipping");
            return None;
        },
    };

    let pool = match create_diesel_pool(DieselDatabaseConfig::for_url(url)).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("database unreachable ({}), skipping", e);
            return None;
        },
    };

    migrations::drop_schema(&pool).await.unwrap();
    let config = MigrationConfig {
        skip_schema: false,
        environment: "test".to_string(),
    };
    let created = migrations::run_migrations(&pool, config.clone()).await.unwrap();
    assert_eq!(created, convertly_core::catalog().len());
    // Second run finds nothing to do
    assert_eq!(migrations::run_migrations(&pool, config).await.unwrap(), 0);

    Some(PgStore::new(pool))
}

async fn insert_sample<E: Entity>(store: &PgStore) -> E {
    let new = parse::<E>(&sample_payload(E::DESCRIPTOR.table)).unwrap();
    store.insert::<E>(new).await.unwrap()
}

async fn seed_everything(store: &PgStore) {
    insert_sample::<User>(store).await;
    insert_sample::<UserProfile>(store).await;
    insert_sample::<BillingHistory>(store).await;
    insert_sample::<TeamMember>(store).await;
    insert_sample::<Funnel>(store).await;
    insert_sample::<Page>(store).await;
    insert_sample::<LeadMagnet>(store).await;
    insert_sample::<Lead>(store).await;
    insert_sample::<Template>(store).await;
    insert_sample::<EmailCampaign>(store).await;
    insert_sample::<EmailTemplate>(store).await;
    insert_sample::<EmailContact>(store).await;
    insert_sample::<EmailAutomation>(store).await;
    insert_sample::<EmailSend>(store).await;
}

#[tokio::test]
#[serial]
async fn test_pg_round_trip_and_defaults() {
    let Some(store) = fresh_store().await else {
        return;
    };
    seed_everything(&store).await;

    let profile = store.get::<UserProfile>(1).await.unwrap();
    assert_eq!(profile.open_rate.to_string(), "42.50");
    assert_eq!(profile.click_rate.to_string(), "0.00");
    assert_eq!(profile.feature_access, vec!["ai_writer".to_string()]);

    let billing = store.get::<BillingHistory>(1).await.unwrap();
    assert_eq!(billing.amount.to_string(), "49.00");

    let funnel = store.get::<Funnel>(1).await.unwrap();
    assert_eq!(funnel.status, FunnelStatus::Draft);
    assert_eq!(funnel.settings, Some(json!({"theme": "light"})));

    let health = store.health_check().await;
    assert!(health.is_healthy);
    assert_eq!(health.backend, "postgres");
}

#[tokio::test]
#[serial]
async fn test_pg_user_delete_cascades_and_orphans() {
    let Some(store) = fresh_store().await else {
        return;
    };
    seed_everything(&store).await;

    store.delete::<User>(1).await.unwrap();

    assert!(store.list::<UserProfile>().await.unwrap().is_empty());
    assert!(store.list::<BillingHistory>().await.unwrap().is_empty());
    assert!(store.list::<TeamMember>().await.unwrap().is_empty());
    assert_eq!(store.get::<Funnel>(1).await.unwrap().user_id, None);
    assert_eq!(store.get::<Lead>(1).await.unwrap().user_id, None);
    assert_eq!(store.get::<LeadMagnet>(1).await.unwrap().user_id, None);
    assert_eq!(store.list::<Page>().await.unwrap().len(), 1);

    store.delete::<Funnel>(1).await.unwrap();
    assert!(store.list::<Page>().await.unwrap().is_empty());
    assert_eq!(store.get::<LeadMagnet>(1).await.unwrap().page_id, None);

    store.delete::<EmailCampaign>(1).await.unwrap();
    assert!(store.list::<EmailSend>().await.unwrap().is_empty());

    assert!(matches!(
        store.delete::<User>(1).await,
        Err(StoreError::NotFound { entity: "users", id: 1 })
    ));
}

#[tokio::test]
#[serial]
async fn test_pg_constraints_map_to_store_errors() {
    let Some(store) = fresh_store().await else {
        return;
    };

    let orphan_page = parse::<Page>(&sample_payload("pages")).unwrap();
    assert!(matches!(
        store.insert::<Page>(orphan_page).await,
        Err(StoreError::Referential(_))
    ));

    insert_sample::<User>(&store).await;
    insert_sample::<Funnel>(&store).await;
    insert_sample::<Page>(&store).await;

    let duplicate = parse::<Page>(&sample_payload("pages")).unwrap();
    let err = store.insert::<Page>(duplicate).await.unwrap_err();
    assert!(matches!(err, StoreError::Constraint(ref name) if name == "pages_funnel_id_order_key"));

    for order in [2, 1] {
        let payload = with_field(sample_payload("pages"), "order", json!(order));
        store.insert::<Page>(parse::<Page>(&payload).unwrap()).await.unwrap();
    }
    let orders: Vec<i32> = store
        .list_by_owner::<Page>(1)
        .await
        .unwrap()
        .iter()
        .map(|p| p.order)
        .collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[tokio::test]
#[serial]
async fn test_pg_download_counter() {
    let Some(store) = fresh_store().await else {
        return;
    };
    insert_sample::<User>(&store).await;
    insert_sample::<Funnel>(&store).await;
    insert_sample::<Page>(&store).await;
    let magnet = insert_sample::<LeadMagnet>(&store).await;

    store.record_lead_magnet_download(magnet.id).await.unwrap();
    let updated = store.record_lead_magnet_download(magnet.id).await.unwrap();
    assert_eq!(updated.downloads, 2);

    assert!(matches!(
        store.record_lead_magnet_download(999).await,
        Err(StoreError::NotFound { .. })
    ));
}
