//! Form state controller.
//!
//! Holds the in-progress draft, validates required fields, and issues the
//! single create call on submit. Creation and observation are decoupled:
//! the new entry becomes visible only through the next subscription
//! snapshot, never through local optimistic insertion.

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::{Identity, IdentityState};
use crate::config::ScopePolicy;
use crate::error::{Error, Result};
use crate::models::{Entry, FieldMap};
use crate::notify::Notifier;
use crate::store::{CollectionPath, DocumentStore};

/// A form's unsaved field values for one entry type.
///
/// `Default` yields the fresh-form state (today's date and current time
/// where applicable, empty text fields).
pub trait Draft: Clone + Default + Send + 'static {
    type Entry: Entry;

    /// Check required fields; the error names the first empty one.
    fn validate(&self) -> Result<()>;

    /// Build the create payload: validated draft values plus the creator's
    /// identity id. The store assigns the creation timestamp.
    fn fields(&self, creator: &Identity) -> Result<FieldMap>;
}

pub struct FormController<D: Draft> {
    draft: D,
    submitting: bool,
    store: Arc<dyn DocumentStore>,
    namespace: String,
    scope: ScopePolicy,
    identity: watch::Receiver<IdentityState>,
    notices: Notifier,
}

impl<D: Draft> FormController<D> {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        namespace: impl Into<String>,
        scope: ScopePolicy,
        identity: watch::Receiver<IdentityState>,
        notices: Notifier,
    ) -> Self {
        Self {
            draft: D::default(),
            submitting: false,
            store,
            namespace: namespace.into(),
            scope,
            identity,
            notices,
        }
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    /// Field edits are plain local mutation with no validation side effects.
    pub fn draft_mut(&mut self) -> &mut D {
        &mut self.draft
    }

    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether the view should enable the submit trigger.
    pub fn can_submit(&self) -> bool {
        !self.submitting && self.identity.borrow().identity().is_some()
    }

    /// Submit the draft as one new record.
    ///
    /// No-op while a submit is already in flight. On any failure the draft
    /// is preserved so the user can correct and retry; on success it resets
    /// to the fresh-form defaults. Every outcome is surfaced through the
    /// notification channel.
    pub async fn submit(&mut self) -> Result<()> {
        if self.submitting {
            return Ok(());
        }

        let Some(creator) = self.identity.borrow().identity().cloned() else {
            self.notices.error(Error::Unauthenticated.to_string());
            return Err(Error::Unauthenticated);
        };

        let fields = match self.draft.fields(&creator) {
            Ok(fields) => fields,
            Err(error) => {
                self.notices.error(error.to_string());
                return Err(error);
            }
        };

        let path = CollectionPath::new(
            self.namespace.clone(),
            self.scope.segment(&creator),
            D::Entry::COLLECTION,
        );

        self.submitting = true;
        let result = self.store.create(&path, fields).await;
        self.submitting = false;

        match result {
            Ok(id) => {
                tracing::debug!("Created record {} in {}", id, path);
                self.draft = D::default();
                self.notices.success("Record saved");
                Ok(())
            }
            Err(error) => {
                let error = Error::Write(error);
                self.notices.error(error.to_string());
                Err(error)
            }
        }
    }
}
