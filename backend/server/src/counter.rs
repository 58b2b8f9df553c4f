//! # Counters
//!
//! Keyed monotonic counters, one per id namespace, e.g. `EVENT_20250615`,
//! `TAG_IT`, `WIKI`.
//!
//! ## Guarantees
//!
//! - Sequential calls for a namespace return `1, 2, 3, ...`
//! - A namespace is created lazily on first use, starting at 1
//! - Counters are never deleted
//! - When the store fails, [`CounterStore::next_value`] returns a value derived
//!   from the clock instead of an error. Those ids are only best-effort unique.
//!
//! ## Atomicity
//!
//! [`RecordCounter`] works on any record store with a read then a write. Two
//! callers that both read `5` before either writes will both get `6`. Known
//! race, left as is for stores without an atomic increment.
//!
//! [`RedisCounter`] uses `HINCRBY`, which Redis applies atomically, so
//! concurrent callers always get distinct values.
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use records::Counter;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::error;

use crate::{
    database::{Filter, RecordStore},
    error::StoreError,
};

pub const COUNTERS_KEY: &str = "counters";

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increments the counter for `namespace` and returns the new value.
    async fn increment(&self, namespace: &str) -> Result<u64, StoreError>;

    /// Like [`increment`](Self::increment), falling back to [`fallback_value`] on error.
    async fn next_value(&self, namespace: &str) -> u64 {
        match self.increment(namespace).await {
            Ok(value) => value,
            Err(e) => {
                let fallback = fallback_value();
                error!(namespace, fallback, "Counter increment failed: {e}");

                fallback
            }
        }
    }
}

/// Current time in milliseconds, modulo 10,000.
pub fn fallback_value() -> u64 {
    Utc::now().timestamp_millis().rem_euclid(10_000) as u64
}

pub struct RecordCounter {
    store: Arc<dyn RecordStore>,
}

impl RecordCounter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    async fn load(&self, namespace: &str) -> Result<Option<Counter>, StoreError> {
        self.store
            .first::<Counter>(&Filter::new().eq("type", namespace))
            .await
    }

    async fn advance(&self, namespace: &str, found: Option<Counter>) -> Result<u64, StoreError> {
        match found {
            Some(counter) => {
                let next = counter.current_value + 1;

                self.store
                    .replace(&Counter {
                        current_value: next,
                        ..counter
                    })
                    .await?;

                Ok(next)
            }
            None => {
                self.store
                    .insert(&Counter {
                        id: None,
                        namespace: namespace.to_string(),
                        current_value: 1,
                    })
                    .await?;

                Ok(1)
            }
        }
    }
}

#[async_trait]
impl CounterStore for RecordCounter {
    async fn increment(&self, namespace: &str) -> Result<u64, StoreError> {
        let found = self.load(namespace).await?;

        self.advance(namespace, found).await
    }
}

#[derive(Clone)]
pub struct RedisCounter {
    connection: ConnectionManager,
}

impl RedisCounter {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl CounterStore for RedisCounter {
    async fn increment(&self, namespace: &str) -> Result<u64, StoreError> {
        let mut connection = self.connection.clone();
        let value: u64 = connection.hincr(COUNTERS_KEY, namespace, 1).await?;

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{database::MemoryStore, testing::BrokenStore};

    fn counter() -> (Arc<dyn RecordStore>, RecordCounter) {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        (store.clone(), RecordCounter::new(store))
    }

    #[tokio::test]
    async fn test_sequential_values() {
        let (_, counter) = counter();

        let mut values = Vec::new();
        for _ in 0..25 {
            values.push(counter.next_value("WIKI").await);
        }

        assert_eq!(values, (1..=25).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_new_namespace_creates_one_record() {
        let (store, counter) = counter();

        assert_eq!(counter.next_value("TAG_IT").await, 1);
        assert_eq!(counter.next_value("TAG_IT").await, 2);

        let counters = store.all::<Counter>().await.unwrap();
        assert_eq!(counters.len(), 1);
        assert_eq!(counters[0].namespace, "TAG_IT");
        assert_eq!(counters[0].current_value, 2);
    }

    #[tokio::test]
    async fn test_namespaces_are_independent() {
        let (_, counter) = counter();

        counter.next_value("EVENT_20250615").await;
        counter.next_value("EVENT_20250615").await;

        assert_eq!(counter.next_value("EVENT_20250616").await, 1);
        assert_eq!(counter.next_value("EVENT_20250615").await, 3);
    }

    #[tokio::test]
    async fn test_store_failure_falls_back() {
        let counter = RecordCounter::new(Arc::new(BrokenStore));

        assert!(counter.increment("CLUB").await.is_err());
        assert!(counter.next_value("CLUB").await < 10_000);
    }

    #[tokio::test]
    async fn test_interleaved_increments_can_collide() {
        let (_, counter) = counter();
        for _ in 0..5 {
            counter.next_value("PARTICIPANT").await;
        }

        // Both callers read 5 before either writes.
        let first = counter.load("PARTICIPANT").await.unwrap();
        let second = counter.load("PARTICIPANT").await.unwrap();

        assert_eq!(counter.advance("PARTICIPANT", first).await.unwrap(), 6);
        assert_eq!(counter.advance("PARTICIPANT", second).await.unwrap(), 6);
        assert_eq!(counter.next_value("PARTICIPANT").await, 7);
    }

    #[test]
    fn test_fallback_range() {
        for _ in 0..100 {
            assert!(fallback_value() < 10_000);
        }
    }
}
