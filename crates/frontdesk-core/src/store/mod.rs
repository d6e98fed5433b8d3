//! Document store seam.
//!
//! The persistent store is a black box offering subscribe/insert/delete on a
//! named collection path. Snapshots are full-state pushes, never deltas, so
//! consumers replace their view wholesale on every event.

mod memory;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{FieldMap, RawRecord, RecordId};

pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Transient connectivity failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// The store refused access to the path
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// A create or delete was rejected
    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// A collection path composed as `{namespace}/{scope}/{collection}`.
///
/// The scope segment partitions records by owner: a fixed shared segment or
/// the resolved identity's id, depending on the configured scoping policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    namespace: String,
    scope: String,
    collection: String,
}

impl CollectionPath {
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        scope: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            scope: scope.into(),
            collection: collection.into(),
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.scope, self.collection)
    }
}

/// One push from a live subscription.
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    /// Full current contents of the subscribed collection
    Snapshot(Vec<RawRecord>),
    /// Non-fatal listener failure; the previous snapshot stays valid
    Error(StoreError),
}

/// A live, single-consumer subscription to one collection.
///
/// Cancellation runs exactly once, on the first of `cancel()` or drop.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<SnapshotEvent>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    #[must_use]
    pub fn new(
        events: mpsc::UnboundedReceiver<SnapshotEvent>,
        cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Wait for the next snapshot or error event.
    ///
    /// Returns `None` once the subscription is cancelled or the store side
    /// closes the stream.
    pub async fn next_event(&mut self) -> Option<SnapshotEvent> {
        self.events.recv().await
    }

    /// Tear the subscription down. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
        self.events.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Black-box document store consumed by the sync layer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a live subscription. The first snapshot fires immediately with
    /// the collection's current contents.
    fn subscribe(&self, path: &CollectionPath) -> Subscription;

    /// Create a record; the store assigns the id and the creation timestamp.
    async fn create(&self, path: &CollectionPath, fields: FieldMap) -> Result<RecordId, StoreError>;

    /// Delete a record. Deleting an id that no longer exists succeeds.
    async fn delete(&self, path: &CollectionPath, id: &RecordId) -> Result<(), StoreError>;
}
