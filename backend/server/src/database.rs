//! # Record store
//!
//! Generic keyed record store behind every domain service.
//!
//! ## Contract
//!
//! - `list(table, filter)`, `get(table, id)`, `create(table, fields)`,
//!   `update(table, id, fields)`, `delete(table, id)`
//! - Filters are conjunctive field predicates, either equality or membership
//! - `create` assigns a uuid when the record has no `id` and refuses an id
//!   that already exists, the only conditional write on offer
//! - `update` merges the given fields into the stored record
//! - The store stamps `createdAt` and `updatedAt`
//!
//! ## Implementations
//!
//! - [`MemoryStore`]: vector per table, insertion ordered, for development and tests
//! - [`RedisStore`]: one hash per table, `records:{table}`, id to JSON record.
//!   Creation goes through `HSETNX` so a taken id is never overwritten.
//!   Listing orders by `createdAt`.
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use records::Entity;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;

pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Value),
    In(Vec<Value>),
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, Predicate)>,
}

impl Filter {
    /// Matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses
            .push((field.to_string(), Predicate::Eq(value.into())));
        self
    }

    pub fn any_of<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push((field.to_string(), Predicate::In(values)));
        self
    }

    /// Missing fields compare as `null`.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.clauses.iter().all(|(field, predicate)| {
            let value = fields.get(field).unwrap_or(&Value::Null);

            match predicate {
                Predicate::Eq(expected) => value == expected,
                Predicate::In(expected) => expected.contains(value),
            }
        })
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, table: &str, filter: &Filter) -> Result<Vec<Fields>, StoreError>;

    async fn get(&self, table: &str, id: &str) -> Result<Option<Fields>, StoreError>;

    async fn create(&self, table: &str, fields: Fields) -> Result<Fields, StoreError>;

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Fields, StoreError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;
}

/// Typed access for [`Entity`] records.
impl<'a> dyn RecordStore + 'a {
    pub async fn find<T: Entity>(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        self.list(T::TABLE, filter)
            .await?
            .into_iter()
            .map(from_fields::<T>)
            .collect()
    }

    pub async fn all<T: Entity>(&self) -> Result<Vec<T>, StoreError> {
        self.find(&Filter::new()).await
    }

    pub async fn first<T: Entity>(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        Ok(self.find(filter).await?.into_iter().next())
    }

    pub async fn fetch<T: Entity>(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.get(T::TABLE, id).await?.map(from_fields::<T>).transpose()
    }

    pub async fn insert<T: Entity>(&self, record: &T) -> Result<T, StoreError> {
        let fields = to_fields(T::TABLE, record)?;
        from_fields(self.create(T::TABLE, fields).await?)
    }

    pub async fn replace<T: Entity>(&self, record: &T) -> Result<T, StoreError> {
        let id = record.id().ok_or(StoreError::MissingId { table: T::TABLE })?;
        let fields = to_fields(T::TABLE, record)?;
        from_fields(self.update(T::TABLE, id, fields).await?)
    }

    pub async fn remove<T: Entity>(&self, id: &str) -> Result<(), StoreError> {
        self.delete(T::TABLE, id).await
    }
}

fn to_fields<T: Serialize>(table: &'static str, record: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::NotARecord { table }),
    }
}

fn from_fields<T: Entity>(fields: Fields) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(fields))?)
}

fn record_id(fields: &Fields) -> Option<&str> {
    fields.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())
}

fn now() -> Value {
    Value::from(Utc::now().to_rfc3339())
}

/// Fills in the id and timestamps of a record about to be created.
fn prepare_create(mut fields: Fields) -> (String, Fields) {
    let id = record_id(&fields)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let stamp = now();
    fields.insert("id".to_string(), Value::from(id.clone()));
    fields.insert("createdAt".to_string(), stamp.clone());
    fields.insert("updatedAt".to_string(), stamp);

    (id, fields)
}

fn merge(stored: &mut Fields, changes: Fields) {
    for (key, value) in changes {
        if key != "id" && key != "createdAt" {
            stored.insert(key, value);
        }
    }
    stored.insert("updatedAt".to_string(), now());
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Fields>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, table: &str, filter: &Filter) -> Result<Vec<Fields>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .get(table)
            .and_then(|rows| rows.iter().find(|row| record_id(row) == Some(id)).cloned()))
    }

    async fn create(&self, table: &str, fields: Fields) -> Result<Fields, StoreError> {
        let (id, fields) = prepare_create(fields);
        let mut tables = self.tables.lock().await;
        let rows = tables.entry(table.to_string()).or_default();

        if rows.iter().any(|row| record_id(row) == Some(id.as_str())) {
            return Err(StoreError::Conflict {
                table: table.to_string(),
                id,
            });
        }

        rows.push(fields.clone());
        Ok(fields)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Fields, StoreError> {
        let mut tables = self.tables.lock().await;

        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| record_id(row) == Some(id)))
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        merge(row, fields);
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;

        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| record_id(row) != Some(id));
        }

        Ok(())
    }
}

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(connection_manager)
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    fn key(table: &str) -> String {
        format!("records:{table}")
    }

    fn decode(raw: &str) -> Result<Fields, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[async_trait]
impl RecordStore for RedisStore {
    async fn list(&self, table: &str, filter: &Filter) -> Result<Vec<Fields>, StoreError> {
        let mut connection = self.connection.clone();
        let rows: HashMap<String, String> = connection.hgetall(Self::key(table)).await?;

        let mut records = rows
            .values()
            .map(|raw| Self::decode(raw))
            .collect::<Result<Vec<_>, _>>()?;

        records.retain(|record| filter.matches(record));
        records.sort_by(|a, b| {
            let created = |r: &Fields| r.get("createdAt").and_then(Value::as_str).map(str::to_string);
            created(a)
                .cmp(&created(b))
                .then_with(|| record_id(a).cmp(&record_id(b)))
        });

        Ok(records)
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.hget(Self::key(table), id).await?;

        raw.as_deref().map(Self::decode).transpose()
    }

    async fn create(&self, table: &str, fields: Fields) -> Result<Fields, StoreError> {
        let (id, fields) = prepare_create(fields);
        let mut connection = self.connection.clone();

        let created: bool = connection
            .hset_nx(Self::key(table), &id, serde_json::to_string(&fields)?)
            .await?;

        if !created {
            return Err(StoreError::Conflict {
                table: table.to_string(),
                id,
            });
        }

        Ok(fields)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Fields, StoreError> {
        let mut stored = self
            .get(table, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        merge(&mut stored, fields);

        let mut connection = self.connection.clone();
        let () = connection
            .hset(Self::key(table), id, serde_json::to_string(&stored)?)
            .await?;

        Ok(stored)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _removed: usize = connection.hdel(Self::key(table), id).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use records::{Club, TagMaster};
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let store = MemoryStore::new();

        let created = store
            .create("Club", fields(json!({ "name": "Go" })))
            .await
            .unwrap();

        assert!(record_id(&created).is_some());
        assert!(created.contains_key("createdAt"));
        assert_eq!(created.get("createdAt"), created.get("updatedAt"));
    }

    #[tokio::test]
    async fn test_create_rejects_taken_id() {
        let store = MemoryStore::new();
        let record = fields(json!({ "id": "CLB-0001", "name": "Go" }));

        store.create("Club", record.clone()).await.unwrap();
        let second = store.create("Club", record).await;

        assert!(matches!(second, Err(StoreError::Conflict { .. })));
        assert_eq!(store.list("Club", &Filter::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_identity() {
        let store = MemoryStore::new();
        store
            .create("Club", fields(json!({ "id": "CLB-0001", "name": "Go", "category": "IT" })))
            .await
            .unwrap();

        let updated = store
            .update("Club", "CLB-0001", fields(json!({ "id": "other", "name": "Shogi" })))
            .await
            .unwrap();

        assert_eq!(updated["id"], "CLB-0001");
        assert_eq!(updated["name"], "Shogi");
        assert_eq!(updated["category"], "IT");

        let missing = store.update("Club", "CLB-9999", Fields::new()).await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_filters() {
        let store = MemoryStore::new();
        for (id, club, status) in [
            ("a1", "CLB-0001", "approved"),
            ("a2", "CLB-0001", "pending"),
            ("a3", "CLB-0002", "approved"),
        ] {
            store
                .create(
                    "ClubApplication",
                    fields(json!({ "id": id, "clubId": club, "status": status })),
                )
                .await
                .unwrap();
        }

        let approved = Filter::new()
            .eq("clubId", "CLB-0001")
            .eq("status", "approved");
        let rows = store.list("ClubApplication", &approved).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "a1");

        let either = Filter::new().any_of("id", ["a2", "a3"]);
        let ids: Vec<_> = store
            .list("ClubApplication", &either)
            .await
            .unwrap()
            .iter()
            .map(|row| row["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!("a2"), json!("a3")]);

        let missing_field = Filter::new().eq("isActive", true);
        assert!(store.list("ClubApplication", &missing_field).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store
            .create("Club", fields(json!({ "id": "CLB-0001", "name": "Go" })))
            .await
            .unwrap();

        store.delete("Club", "CLB-0001").await.unwrap();
        store.delete("Club", "CLB-0001").await.unwrap();

        assert!(store.get("Club", "CLB-0001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_typed_access() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());

        let club = store
            .insert(&Club {
                id: Some("CLB-0001".to_string()),
                name: "Go".to_string(),
                created_by: "u1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(club.created_at.is_some());

        let renamed = store
            .replace(&Club {
                name: "Shogi".to_string(),
                ..club
            })
            .await
            .unwrap();
        assert_eq!(renamed.name, "Shogi");

        let fetched: Option<Club> = store.fetch("CLB-0001").await.unwrap();
        assert_eq!(fetched.map(|c| c.name), Some("Shogi".to_string()));

        let unsaved = TagMaster {
            id: None,
            name: "Go".to_string(),
            category: "hobby".to_string(),
            is_active: Some(true),
        };
        assert!(matches!(
            store.replace(&unsaved).await,
            Err(StoreError::MissingId { table: "TagMaster" })
        ));

        store.remove::<Club>("CLB-0001").await.unwrap();
        assert!(store.all::<Club>().await.unwrap().is_empty());
    }
}
