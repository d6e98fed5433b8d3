//! Live collection synchronization.
//!
//! One worker per collection owns the subscription lifecycle: it waits for a
//! resolved identity, subscribes to the scoped path, and republishes every
//! snapshot as a typed, sorted list. The published list is a strict mirror
//! of the last snapshot; it is never merged, patched or spliced locally.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::IdentityState;
use crate::config::ScopePolicy;
use crate::error::Error;
use crate::filter::filter_entries;
use crate::models::{sort_newest_first, Entry, RawRecord};
use crate::notify::Notifier;
use crate::store::{CollectionPath, DocumentStore, SnapshotEvent};

/// Project a raw snapshot into the rendered list.
///
/// Deduplicates by id, maps raw records to typed entries (malformed records
/// are dropped with a warning, never abort the snapshot), and sorts
/// newest-first.
pub fn project_snapshot<E: Entry>(records: &[RawRecord]) -> Vec<E> {
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id.clone()) {
            continue;
        }
        match E::from_record(record) {
            Some(entry) => entries.push(entry),
            None => {
                tracing::warn!(
                    "Dropping malformed record {} from {} snapshot",
                    record.id,
                    E::COLLECTION
                );
            }
        }
    }
    sort_newest_first(&mut entries);
    entries
}

/// Read side of a synchronized list.
#[derive(Clone)]
pub struct LiveList<E> {
    rx: watch::Receiver<Vec<E>>,
}

impl<E: Entry> LiveList<E> {
    /// The current sorted list.
    pub fn current(&self) -> Vec<E> {
        self.rx.borrow().clone()
    }

    /// Wait for the next published list. Returns `false` once the worker
    /// is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// A fresh receiver for view-layer bindings.
    pub fn watch(&self) -> watch::Receiver<Vec<E>> {
        self.rx.clone()
    }

    /// Case-insensitive substring view over the current list. Pure; the
    /// underlying list is untouched.
    pub fn filtered(&self, query: &str) -> Vec<E> {
        filter_entries(&self.rx.borrow(), query)
    }
}

enum Step {
    Identity { adapter_gone: bool },
    Store(Option<SnapshotEvent>),
}

/// Long-lived worker owning the subscription for one collection.
pub struct SyncWorker<E: Entry> {
    store: Arc<dyn DocumentStore>,
    namespace: String,
    scope: ScopePolicy,
    identity: watch::Receiver<IdentityState>,
    notices: Notifier,
    tx: watch::Sender<Vec<E>>,
}

impl<E: Entry> SyncWorker<E> {
    /// Spawn the worker and hand back the read side of its list.
    pub fn spawn(
        store: Arc<dyn DocumentStore>,
        namespace: impl Into<String>,
        scope: ScopePolicy,
        identity: watch::Receiver<IdentityState>,
        notices: Notifier,
    ) -> (LiveList<E>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(Vec::new());
        let worker = Self {
            store,
            namespace: namespace.into(),
            scope,
            identity,
            notices,
            tx,
        };
        let handle = tokio::spawn(worker.run());
        (LiveList { rx }, handle)
    }

    async fn run(mut self) {
        'resubscribe: loop {
            // Suspended until an identity resolves; nothing is attempted or
            // queued while unresolved, and a signed-out desk mirrors nothing.
            let identity = loop {
                if let IdentityState::SignedIn(identity) =
                    self.identity.borrow_and_update().clone()
                {
                    break identity;
                }
                self.tx.send_replace(Vec::new());
                if self.identity.changed().await.is_err() {
                    return;
                }
            };

            let path = CollectionPath::new(
                self.namespace.clone(),
                self.scope.segment(&identity),
                E::COLLECTION,
            );
            tracing::debug!("Opening live subscription on {}", path);
            let mut subscription = self.store.subscribe(&path);

            loop {
                let step = tokio::select! {
                    changed = self.identity.changed() => Step::Identity {
                        adapter_gone: changed.is_err(),
                    },
                    event = subscription.next_event() => Step::Store(event),
                };

                match step {
                    Step::Identity { adapter_gone } => {
                        // The old listener must be gone before any new one
                        // exists; two live listeners is a defect.
                        subscription.cancel();
                        self.tx.send_replace(Vec::new());
                        if adapter_gone {
                            return;
                        }
                        continue 'resubscribe;
                    }
                    Step::Store(Some(SnapshotEvent::Snapshot(records))) => {
                        self.tx.send_replace(project_snapshot::<E>(&records));
                    }
                    Step::Store(Some(SnapshotEvent::Error(error))) => {
                        // Non-fatal: the last-known list stays visible.
                        tracing::warn!("Live subscription error on {}: {}", path, error);
                        self.notices.error(Error::Subscription(error).to_string());
                    }
                    Step::Store(None) => {
                        tracing::debug!("Subscription stream on {} closed by the store", path);
                        subscription.cancel();
                        if self.identity.changed().await.is_err() {
                            return;
                        }
                        continue 'resubscribe;
                    }
                }
            }
        }
    }
}
