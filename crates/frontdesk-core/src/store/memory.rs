//! In-process document store.
//!
//! Backs the integration tests and demos with the same snapshot semantics
//! the real store exposes: an initial snapshot fires immediately on
//! subscribe, and every create/delete rebroadcasts the full collection to
//! all subscribers of that path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::{FieldMap, RawRecord, RecordId};
use crate::store::{CollectionPath, DocumentStore, SnapshotEvent, StoreError, Subscription};

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<RawRecord>>,
    subscribers: HashMap<String, Vec<Subscriber>>,
    next_subscriber: u64,
    fail_next_write: Option<String>,
}

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<SnapshotEvent>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next create/delete fail with the given reason.
    pub fn fail_next_write(&self, reason: impl Into<String>) {
        let mut inner = self.lock();
        inner.fail_next_write = Some(reason.into());
    }

    /// Push a listener error to every subscriber of the path.
    pub fn emit_subscription_error(&self, path: &CollectionPath, error: StoreError) {
        let mut inner = self.lock();
        let key = path.to_string();
        if let Some(subscribers) = inner.subscribers.get_mut(&key) {
            subscribers.retain(|subscriber| {
                subscriber
                    .tx
                    .send(SnapshotEvent::Error(error.clone()))
                    .is_ok()
            });
        }
    }

    /// Insert a record verbatim (no id minting, no timestamp) and broadcast.
    ///
    /// Lets tests seed unstamped or malformed records.
    pub fn seed(&self, path: &CollectionPath, record: RawRecord) {
        let mut inner = self.lock();
        let key = path.to_string();
        inner.collections.entry(key.clone()).or_default().push(record);
        Self::broadcast(&mut inner, &key);
    }

    /// Current raw contents of a collection.
    #[must_use]
    pub fn records(&self, path: &CollectionPath) -> Vec<RawRecord> {
        let inner = self.lock();
        inner
            .collections
            .get(&path.to_string())
            .cloned()
            .unwrap_or_default()
    }

    /// Number of live subscribers on a path.
    #[must_use]
    pub fn subscriber_count(&self, path: &CollectionPath) -> usize {
        let inner = self.lock();
        inner
            .subscribers
            .get(&path.to_string())
            .map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn broadcast(inner: &mut Inner, key: &str) {
        let records = inner.collections.get(key).cloned().unwrap_or_default();
        if let Some(subscribers) = inner.subscribers.get_mut(key) {
            subscribers.retain(|subscriber| {
                subscriber
                    .tx
                    .send(SnapshotEvent::Snapshot(records.clone()))
                    .is_ok()
            });
        }
    }

    fn take_write_failure(inner: &mut Inner) -> Option<StoreError> {
        inner.fail_next_write.take().map(StoreError::Rejected)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn subscribe(&self, path: &CollectionPath) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let key = path.to_string();

        let subscriber_id = {
            let mut inner = self.lock();
            let subscriber_id = inner.next_subscriber;
            inner.next_subscriber += 1;

            let records = inner.collections.get(&key).cloned().unwrap_or_default();
            // Initial snapshot before the subscriber is registered; ignore a
            // receiver that is already gone.
            let _ = tx.send(SnapshotEvent::Snapshot(records));

            inner
                .subscribers
                .entry(key.clone())
                .or_default()
                .push(Subscriber {
                    id: subscriber_id,
                    tx,
                });
            subscriber_id
        };

        let store = Arc::clone(&self.inner);
        Subscription::new(rx, move || {
            let mut inner = match store.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(subscribers) = inner.subscribers.get_mut(&key) {
                subscribers.retain(|subscriber| subscriber.id != subscriber_id);
            }
        })
    }

    async fn create(&self, path: &CollectionPath, fields: FieldMap) -> Result<RecordId, StoreError> {
        let mut inner = self.lock();
        if let Some(error) = Self::take_write_failure(&mut inner) {
            return Err(error);
        }

        let id = RecordId::new(Uuid::now_v7().to_string());
        let mut fields = fields;
        fields.insert(
            "createdAt".to_string(),
            serde_json::json!(chrono::Utc::now().timestamp_millis()),
        );

        let key = path.to_string();
        inner
            .collections
            .entry(key.clone())
            .or_default()
            .push(RawRecord::new(id.clone(), fields));
        Self::broadcast(&mut inner, &key);
        Ok(id)
    }

    async fn delete(&self, path: &CollectionPath, id: &RecordId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(error) = Self::take_write_failure(&mut inner) {
            return Err(error);
        }

        let key = path.to_string();
        if let Some(records) = inner.collections.get_mut(&key) {
            records.retain(|record| &record.id != id);
        }
        Self::broadcast(&mut inner, &key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn visits_path() -> CollectionPath {
        CollectionPath::new("frontdesk", "public", "visits")
    }

    fn company_fields(company: &str) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("company".to_string(), json!(company));
        fields
    }

    async fn expect_snapshot(subscription: &mut Subscription) -> Vec<RawRecord> {
        match subscription.next_event().await {
            Some(SnapshotEvent::Snapshot(records)) => records,
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscribe_fires_an_initial_snapshot() {
        let store = MemoryStore::new();
        store
            .create(&visits_path(), company_fields("Acme"))
            .await
            .unwrap();

        let mut subscription = store.subscribe(&visits_path());
        let records = expect_snapshot(&mut subscription).await;
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn create_stamps_and_broadcasts_the_full_collection() {
        let store = MemoryStore::new();
        let mut subscription = store.subscribe(&visits_path());
        expect_snapshot(&mut subscription).await;

        let id = store
            .create(&visits_path(), company_fields("Acme"))
            .await
            .unwrap();

        let records = expect_snapshot(&mut subscription).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert!(records[0].integer("createdAt").is_some());
    }

    #[tokio::test]
    async fn delete_of_a_missing_id_succeeds() {
        let store = MemoryStore::new();
        store
            .delete(&visits_path(), &RecordId::from("ghost"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancel_removes_the_subscriber() {
        let store = MemoryStore::new();
        let mut subscription = store.subscribe(&visits_path());
        assert_eq!(store.subscriber_count(&visits_path()), 1);

        subscription.cancel();
        assert_eq!(store.subscriber_count(&visits_path()), 0);
    }

    #[tokio::test]
    async fn fail_next_write_rejects_one_write_only() {
        let store = MemoryStore::new();
        store.fail_next_write("quota exceeded");

        let error = store
            .create(&visits_path(), company_fields("Acme"))
            .await
            .unwrap_err();
        assert_eq!(error, StoreError::Rejected("quota exceeded".to_string()));

        store
            .create(&visits_path(), company_fields("Acme"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn emitted_errors_reach_subscribers() {
        let store = MemoryStore::new();
        let mut subscription = store.subscribe(&visits_path());
        expect_snapshot(&mut subscription).await;

        store.emit_subscription_error(
            &visits_path(),
            StoreError::Unavailable("connection reset".to_string()),
        );

        match subscription.next_event().await {
            Some(SnapshotEvent::Error(StoreError::Unavailable(reason))) => {
                assert_eq!(reason, "connection reset");
            }
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn snapshots_are_scoped_per_path() {
        let store = MemoryStore::new();
        let residents = CollectionPath::new("frontdesk", "public", "residents");
        let mut subscription = store.subscribe(&residents);
        expect_snapshot(&mut subscription).await;

        store
            .create(&visits_path(), company_fields("Acme"))
            .await
            .unwrap();

        let mut fields = FieldMap::new();
        fields.insert("name".to_string(), json!("Maria"));
        store.create(&residents, fields).await.unwrap();

        let records = expect_snapshot(&mut subscription).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].text("name").is_some());
    }
}
