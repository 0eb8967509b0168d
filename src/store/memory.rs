use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{EntityStore, StoreError, StoreHealth};
use crate::contract;
use crate::descriptor::{
    dependents_of, EntityDescriptor, FieldDefault, FieldType, OnDelete,
};
use crate::migrations::ddl::unique_constraint_name;
use crate::models::{Entity, LeadMagnet};

type Row = Map<String, Value>;

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<&'static str, BTreeMap<i32, Row>>,
    last_ids: HashMap<&'static str, i32>,
}

impl Tables {
    fn table(&self, name: &str) -> Option<&BTreeMap<i32, Row>> {
        self.rows.get(name)
    }

    fn contains(&self, name: &str, id: i32) -> bool {
        self.table(name).is_some_and(|rows| rows.contains_key(&id))
    }

    fn next_id(&mut self, name: &'static str) -> i32 {
        let id = self.last_ids.entry(name).or_insert(0);
        *id += 1;
        *id
    }

    /// Remove a row, then cascade or null out everything pointing at it
    fn remove(&mut self, table: &'static str, id: i32) -> bool {
        let removed = self
            .rows
            .get_mut(table)
            .and_then(|rows| rows.remove(&id))
            .is_some();
        if !removed {
            return false;
        }

        for relation in dependents_of(table) {
            let Some(children) = self.rows.get_mut(relation.child) else {
                continue;
            };
            let referencing: Vec<i32> = children
                .iter()
                .filter(|(_, row)| row.get(relation.column).and_then(Value::as_i64) == Some(id.into()))
                .map(|(child_id, _)| *child_id)
                .collect();

            match relation.on_delete {
                OnDelete::SetNull => {
                    for child_id in &referencing {
                        if let Some(row) = children.get_mut(child_id) {
                            row.insert(relation.column.to_string(), Value::Null);
                        }
                    }
                },
                OnDelete::Cascade => {
                    for child_id in referencing {
                        self.remove(relation.child, child_id);
                    }
                },
            }
        }
        true
    }
}

/// In-process backend holding rows as JSON maps keyed by table and id.
///
/// Every operation takes the single lock, so an insert with its checks
/// or a delete with its whole cascade is atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored in `table`
    pub async fn count(&self, table: &str) -> usize {
        self.tables.read().await.table(table).map_or(0, BTreeMap::len)
    }
}

fn now_text() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn default_value(ty: FieldType, default: FieldDefault) -> Value {
    match default {
        FieldDefault::Now => Value::String(now_text()),
        FieldDefault::Text(text) => Value::String(text.to_string()),
        FieldDefault::Integer(n) => Value::from(n),
        FieldDefault::Boolean(b) => Value::Bool(b),
        FieldDefault::Decimal(text) => Value::String(text.to_string()),
        FieldDefault::EmptyList => match ty {
            FieldType::TextList | FieldType::JsonList { .. } => Value::Array(Vec::new()),
            _ => Value::Null,
        },
    }
}

/// Full row from a verified insert payload: absent values take their
/// column default, server-assigned columns without one start out null
fn materialize(descriptor: &EntityDescriptor, payload: &Row) -> Row {
    descriptor
        .fields
        .iter()
        .map(|field| {
            let supplied = payload.get(field.name).filter(|v| !v.is_null()).cloned();
            let value = supplied
                .or_else(|| field.default.map(|d| default_value(field.ty, d)))
                .unwrap_or(Value::Null);
            (field.name.to_string(), value)
        })
        .collect()
}

fn check_references(
    tables: &Tables,
    descriptor: &EntityDescriptor,
    row: &Row,
) -> Result<(), StoreError> {
    for (field, fk) in descriptor.foreign_keys() {
        let Some(target) = row.get(field.name).and_then(Value::as_i64) else {
            continue;
        };
        let exists = i32::try_from(target).is_ok_and(|id| tables.contains(fk.table, id));
        if !exists {
            return Err(StoreError::Referential(format!(
                "{}.{} = {} references a missing {} row",
                descriptor.table, field.name, target, fk.table
            )));
        }
    }
    Ok(())
}

fn check_unique(tables: &Tables, descriptor: &EntityDescriptor, row: &Row) -> Result<(), StoreError> {
    let Some(existing) = tables.table(descriptor.table) else {
        return Ok(());
    };

    let single = descriptor
        .fields
        .iter()
        .filter(|f| f.unique)
        .map(|f| std::slice::from_ref(&f.name));
    let groups = single.chain(descriptor.unique_together.iter().copied());

    for columns in groups {
        let key: Vec<&Value> = columns.iter().filter_map(|c| row.get(*c)).collect();
        // NULLs never collide, as in SQL
        if key.len() != columns.len() || key.iter().any(|v| v.is_null()) {
            continue;
        }
        let collides = existing
            .values()
            .any(|other| columns.iter().zip(&key).all(|(c, v)| other.get(*c) == Some(*v)));
        if collides {
            return Err(StoreError::Constraint(unique_constraint_name(
                descriptor.table,
                columns,
            )));
        }
    }
    Ok(())
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.to_string().cmp(&y.to_string()),
        },
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        },
        // NULLS LAST, as PostgreSQL sorts ascending
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        (Some(Value::Null) | None, _) => Ordering::Greater,
        (_, Some(Value::Null) | None) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn decode<E: Entity>(row: &Row) -> Result<E, StoreError> {
    Ok(serde_json::from_value(Value::Object(row.clone()))?)
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn insert<E: Entity>(&self, new: E::Insert) -> Result<E, StoreError> {
        let descriptor = E::DESCRIPTOR;
        let new = contract::verify::<E>(&new)?;
        let payload = match serde_json::to_value(&new)? {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Serialization(format!(
                    "{} insert encoded as {}",
                    descriptor.table, other
                )))
            },
        };

        let mut tables = self.tables.write().await;
        let mut row = materialize(descriptor, &payload);
        check_references(&tables, descriptor, &row)?;
        check_unique(&tables, descriptor, &row)?;

        let id = tables.next_id(descriptor.table);
        row.insert("id".to_string(), Value::from(id));
        let entity = decode::<E>(&row)?;

        tables.rows.entry(descriptor.table).or_default().insert(id, row);
        debug!("[STORE] Inserted {} {}", descriptor.table, id);
        Ok(entity)
    }

    async fn find<E: Entity>(&self, id: i32) -> Result<Option<E>, StoreError> {
        let tables = self.tables.read().await;
        tables
            .table(E::DESCRIPTOR.table)
            .and_then(|rows| rows.get(&id))
            .map(decode::<E>)
            .transpose()
    }

    async fn list<E: Entity>(&self) -> Result<Vec<E>, StoreError> {
        let tables = self.tables.read().await;
        tables
            .table(E::DESCRIPTOR.table)
            .into_iter()
            .flat_map(BTreeMap::values)
            .map(decode::<E>)
            .collect()
    }

    async fn list_by_owner<E: Entity>(&self, owner_id: i32) -> Result<Vec<E>, StoreError> {
        let descriptor = E::DESCRIPTOR;
        let tables = self.tables.read().await;

        let mut rows: Vec<(&i32, &Row)> = tables
            .table(descriptor.table)
            .into_iter()
            .flat_map(|rows| rows.iter())
            .filter(|(_, row)| {
                row.get(descriptor.owner).and_then(Value::as_i64) == Some(owner_id.into())
            })
            .collect();
        rows.sort_by(|(a_id, a), (b_id, b)| {
            compare_values(a.get(descriptor.order_by), b.get(descriptor.order_by))
                .then(a_id.cmp(b_id))
        });

        rows.into_iter().map(|(_, row)| decode::<E>(row)).collect()
    }

    async fn delete<E: Entity>(&self, id: i32) -> Result<(), StoreError> {
        let table = E::DESCRIPTOR.table;
        let mut tables = self.tables.write().await;

        if !tables.remove(table, id) {
            return Err(StoreError::NotFound { entity: table, id });
        }
        info!("[STORE] Deleted {} {}", table, id);
        Ok(())
    }

    async fn record_lead_magnet_download(&self, id: i32) -> Result<LeadMagnet, StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .rows
            .get_mut("lead_magnets")
            .and_then(|rows| rows.get_mut(&id))
            .ok_or(StoreError::NotFound {
                entity: "lead_magnets",
                id,
            })?;

        let downloads = row
            .get("downloads")
            .and_then(Value::as_i64)
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| {
                StoreError::Constraint(format!("lead_magnets {} download counter is at its maximum", id))
            })?;
        row.insert("downloads".to_string(), Value::from(downloads));
        row.insert("updated_at".to_string(), Value::String(now_text()));
        decode::<LeadMagnet>(row)
    }

    async fn health_check(&self) -> StoreHealth {
        StoreHealth {
            backend: "memory",
            is_healthy: true,
            latency_ms: 0,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Funnel, FunnelType, NewFunnel, NewUser, User};

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "secret".to_string(),
            email: None,
            name: None,
            phone: None,
            account_type: None,
        }
    }

    #[tokio::test]
    async fn test_insert_fills_server_columns() {
        let store = MemoryStore::new();
        let user: User = store.insert::<User>(new_user("ada")).await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.account_type, "Free");
        assert!(user.created_at <= Utc::now());

        let second: User = store.insert::<User>(new_user("grace")).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_unique_username() {
        let store = MemoryStore::new();
        store.insert::<User>(new_user("ada")).await.unwrap();

        let err = store.insert::<User>(new_user("ada")).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(name) if name == "users_username_key"));
        assert_eq!(store.count("users").await, 1);
    }

    #[tokio::test]
    async fn test_funnel_without_owner_is_allowed() {
        let store = MemoryStore::new();
        let funnel: Funnel = store
            .insert::<Funnel>(NewFunnel {
                user_id: None,
                name: "Webinar".to_string(),
                description: None,
                funnel_type: FunnelType::Webinar,
                status: None,
                settings: None,
                analytics: None,
            })
            .await
            .unwrap();
        assert_eq!(funnel.user_id, None);
        assert_eq!(funnel.status.as_str(), "draft");
    }

    #[tokio::test]
    async fn test_download_counter_stops_at_i32_max() {
        let store = MemoryStore::new();
        let magnet: LeadMagnet = store
            .insert::<LeadMagnet>(crate::models::NewLeadMagnet {
                user_id: None,
                page_id: None,
                name: "Checklist".to_string(),
                magnet_type: crate::models::LeadMagnetType::Checklist,
                description: None,
                content: None,
                status: None,
            })
            .await
            .unwrap();

        {
            let mut tables = store.tables.write().await;
            let row = tables
                .rows
                .get_mut("lead_magnets")
                .and_then(|rows| rows.get_mut(&magnet.id))
                .unwrap();
            row.insert("downloads".to_string(), Value::from(i32::MAX));
        }

        let err = store.record_lead_magnet_download(magnet.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
        let unchanged = store.get::<LeadMagnet>(magnet.id).await.unwrap();
        assert_eq!(unchanged.downloads, i32::MAX);
    }

    #[test]
    fn test_compare_values_orders_nulls_last() {
        let one = Value::from(1);
        let two = Value::from(2);
        assert_eq!(compare_values(Some(&one), Some(&two)), Ordering::Less);
        assert_eq!(compare_values(Some(&Value::Null), Some(&one)), Ordering::Greater);
        assert_eq!(compare_values(None, None), Ordering::Equal);
    }
}
