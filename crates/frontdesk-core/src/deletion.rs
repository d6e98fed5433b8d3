//! Deletion workflow.
//!
//! Deletes are irreversible, so they go through an explicit confirmation
//! state machine: `Idle -> ConfirmPending -> Idle`. The list itself only
//! changes through the next subscription snapshot; the workflow never
//! splices entries out locally.

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::IdentityState;
use crate::config::ScopePolicy;
use crate::error::{Error, Result};
use crate::models::{Entry, RecordId};
use crate::notify::Notifier;
use crate::store::{CollectionPath, DocumentStore};

/// Where the workflow currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeletionState {
    #[default]
    Idle,
    /// Awaiting confirmation. The label was snapshotted at request time and
    /// does not change if the list updates while the dialog is open.
    ConfirmPending { target: RecordId, label: String },
}

pub struct DeletionWorkflow<E: Entry> {
    state: DeletionState,
    store: Arc<dyn DocumentStore>,
    namespace: String,
    scope: ScopePolicy,
    identity: watch::Receiver<IdentityState>,
    notices: Notifier,
    _entry: PhantomData<fn() -> E>,
}

impl<E: Entry> DeletionWorkflow<E> {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        namespace: impl Into<String>,
        scope: ScopePolicy,
        identity: watch::Receiver<IdentityState>,
        notices: Notifier,
    ) -> Self {
        Self {
            state: DeletionState::Idle,
            store,
            namespace: namespace.into(),
            scope,
            identity,
            notices,
            _entry: PhantomData,
        }
    }

    pub const fn state(&self) -> &DeletionState {
        &self.state
    }

    /// Open the confirmation step for an entry in the synchronized list.
    ///
    /// A target absent from the list is a no-op: it already disappeared,
    /// e.g. a lost race with a concurrent deletion by another session.
    pub fn request_delete(&mut self, id: &RecordId, entries: &[E]) -> Result<()> {
        if self.identity.borrow().identity().is_none() {
            self.notices.error(Error::Unauthenticated.to_string());
            return Err(Error::Unauthenticated);
        }

        let Some(entry) = entries.iter().find(|entry| entry.id() == id) else {
            tracing::debug!("Delete requested for {} which is no longer listed", id);
            return Ok(());
        };

        self.state = DeletionState::ConfirmPending {
            target: id.clone(),
            label: entry.label(),
        };
        Ok(())
    }

    /// Issue the delete for the pending target. No-op when `Idle`.
    ///
    /// The state returns to `Idle` before the delete resolves, so the
    /// confirmation trigger cannot double-submit. On failure the entry may
    /// still be visible via the next snapshot; deletion is retryable
    /// through a fresh `request_delete`.
    pub async fn confirm(&mut self) -> Result<()> {
        let DeletionState::ConfirmPending { target, label } =
            std::mem::take(&mut self.state)
        else {
            return Ok(());
        };

        let Some(identity) = self.identity.borrow().identity().cloned() else {
            self.notices.error(Error::Unauthenticated.to_string());
            return Err(Error::Unauthenticated);
        };

        let path = CollectionPath::new(
            self.namespace.clone(),
            self.scope.segment(&identity),
            E::COLLECTION,
        );

        match self.store.delete(&path, &target).await {
            Ok(()) => {
                tracing::debug!("Deleted record {} ({}) from {}", target, label, path);
                self.notices.success("Record deleted");
                Ok(())
            }
            Err(error) => {
                let error = Error::Write(error);
                self.notices.error(error.to_string());
                Err(error)
            }
        }
    }

    /// Close the confirmation step without side effects. No-op when `Idle`.
    pub fn cancel(&mut self) {
        self.state = DeletionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::auth::Identity;
    use crate::models::{RawRecord, VisitRecord};
    use crate::store::MemoryStore;
    use crate::sync::project_snapshot;

    use super::*;

    fn visits_path() -> CollectionPath {
        CollectionPath::new("frontdesk", "public", "visits")
    }

    async fn seeded_store() -> (Arc<MemoryStore>, Vec<VisitRecord>) {
        let store = Arc::new(MemoryStore::new());
        let serde_json::Value::Object(fields) = json!({
            "company": "Acme Corp",
            "serviceDate": "2024-05-01",
            "serviceTime": "09:00",
        }) else {
            unreachable!()
        };
        store.create(&visits_path(), fields).await.unwrap();
        let entries = project_snapshot(&store.records(&visits_path()));
        (store, entries)
    }

    fn workflow(
        store: Arc<MemoryStore>,
        state: IdentityState,
    ) -> DeletionWorkflow<VisitRecord> {
        let (_identity_tx, identity_rx) = watch::channel(state);
        DeletionWorkflow::new(
            store,
            "frontdesk",
            ScopePolicy::Shared,
            identity_rx,
            Notifier::new(Duration::from_secs(4)),
        )
    }

    fn signed_in() -> IdentityState {
        IdentityState::SignedIn(Identity::new("user-1"))
    }

    #[tokio::test]
    async fn request_then_cancel_touches_nothing() {
        let (store, entries) = seeded_store().await;
        let mut workflow = workflow(store.clone(), signed_in());

        workflow.request_delete(entries[0].id(), &entries).unwrap();
        match workflow.state() {
            DeletionState::ConfirmPending { label, .. } => {
                assert_eq!(label, "Acme Corp (01/05/2024 09:00)");
            }
            DeletionState::Idle => panic!("expected ConfirmPending"),
        }

        workflow.cancel();
        assert_eq!(*workflow.state(), DeletionState::Idle);
        assert_eq!(store.records(&visits_path()).len(), 1);
    }

    #[tokio::test]
    async fn absent_target_is_a_noop() {
        let (store, entries) = seeded_store().await;
        let mut workflow = workflow(store, signed_in());

        workflow
            .request_delete(&RecordId::from("ghost"), &entries)
            .unwrap();
        assert_eq!(*workflow.state(), DeletionState::Idle);
    }

    #[tokio::test]
    async fn confirm_deletes_and_returns_to_idle() {
        let (store, entries) = seeded_store().await;
        let mut workflow = workflow(store.clone(), signed_in());

        workflow.request_delete(entries[0].id(), &entries).unwrap();
        workflow.confirm().await.unwrap();

        assert_eq!(*workflow.state(), DeletionState::Idle);
        assert!(store.records(&visits_path()).is_empty());
        assert_eq!(
            workflow.notices.current().map(|notice| notice.message),
            Some("Record deleted".to_string())
        );
    }

    #[tokio::test]
    async fn failed_delete_is_retryable() {
        let (store, entries) = seeded_store().await;
        let mut workflow = workflow(store.clone(), signed_in());

        store.fail_next_write("offline");
        workflow.request_delete(entries[0].id(), &entries).unwrap();
        let error = workflow.confirm().await.unwrap_err();
        assert!(matches!(error, Error::Write(_)));
        assert_eq!(*workflow.state(), DeletionState::Idle);
        assert_eq!(store.records(&visits_path()).len(), 1);

        workflow.request_delete(entries[0].id(), &entries).unwrap();
        workflow.confirm().await.unwrap();
        assert!(store.records(&visits_path()).is_empty());
    }

    #[tokio::test]
    async fn label_is_snapshotted_at_request_time() {
        let (store, entries) = seeded_store().await;
        let mut workflow = workflow(store.clone(), signed_in());
        workflow.request_delete(entries[0].id(), &entries).unwrap();

        // The list updates while the dialog is open; the label must not.
        let serde_json::Value::Object(fields) = json!({
            "company": "Newcomer",
            "serviceDate": "2024-06-01",
            "serviceTime": "10:00",
        }) else {
            unreachable!()
        };
        store.create(&visits_path(), fields).await.unwrap();

        match workflow.state() {
            DeletionState::ConfirmPending { label, .. } => {
                assert_eq!(label, "Acme Corp (01/05/2024 09:00)");
            }
            DeletionState::Idle => panic!("expected ConfirmPending"),
        }
    }

    #[tokio::test]
    async fn idle_confirm_and_cancel_are_noops() {
        let (store, _entries) = seeded_store().await;
        let mut workflow = workflow(store.clone(), signed_in());

        workflow.cancel();
        workflow.confirm().await.unwrap();
        assert_eq!(*workflow.state(), DeletionState::Idle);
        assert_eq!(store.records(&visits_path()).len(), 1);
    }

    #[tokio::test]
    async fn unauthenticated_request_is_rejected() {
        let (store, entries) = seeded_store().await;
        let mut workflow = workflow(store, IdentityState::Unresolved);

        let error = workflow
            .request_delete(entries[0].id(), &entries)
            .unwrap_err();
        assert!(matches!(error, Error::Unauthenticated));
        assert_eq!(*workflow.state(), DeletionState::Idle);
    }

    #[tokio::test]
    async fn malformed_seed_never_reaches_entries() {
        // Guard for the projection used by request_delete lookups.
        let store = Arc::new(MemoryStore::new());
        let serde_json::Value::Object(fields) = json!({ "company": "No dates" }) else {
            unreachable!()
        };
        store.seed(&visits_path(), RawRecord::new("bad".into(), fields));
        let entries: Vec<VisitRecord> = project_snapshot(&store.records(&visits_path()));
        assert!(entries.is_empty());
    }
}
