//! Desk context: the explicitly constructed, injected wiring.
//!
//! A `Desk` owns the store handle, the identity adapter and the single
//! notification slot, and opens one `Register` per entity type. There are
//! no module-level globals; test doubles plug in through the store and
//! provider traits.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::auth::{IdentityAdapter, IdentityProvider, IdentityState};
use crate::config::{DeskConfig, ScopePolicy};
use crate::deletion::DeletionWorkflow;
use crate::error::Result;
use crate::form::{Draft, FormController};
use crate::models::{Entry, RecordId, ResidentDraft, ResidentRecord, VisitDraft, VisitRecord};
use crate::notify::Notifier;
use crate::store::DocumentStore;
use crate::sync::{LiveList, SyncWorker};

pub struct Desk {
    store: Arc<dyn DocumentStore>,
    identity: IdentityAdapter,
    notices: Notifier,
    config: DeskConfig,
}

impl Desk {
    /// Build a desk over the given store and identity provider.
    ///
    /// The configuration is validated here, once; nothing is read from the
    /// ambient environment.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn IdentityProvider>,
        config: DeskConfig,
    ) -> Result<Self> {
        config.validate()?;
        let identity = IdentityAdapter::new(provider, config.auth_token.clone());
        let notices = Notifier::new(config.notice_ttl);
        Ok(Self {
            store,
            identity,
            notices,
            config,
        })
    }

    /// Run the startup authentication attempt.
    pub async fn resolve_identity(&self) -> IdentityState {
        self.identity.resolve().await
    }

    pub const fn identity(&self) -> &IdentityAdapter {
        &self.identity
    }

    pub const fn notices(&self) -> &Notifier {
        &self.notices
    }

    /// Open the visit register (companies/service providers).
    pub fn visits(&self) -> Register<VisitRecord, VisitDraft> {
        self.open_register(self.config.visit_scope)
    }

    /// Open the resident register.
    pub fn residents(&self) -> Register<ResidentRecord, ResidentDraft> {
        self.open_register(self.config.resident_scope)
    }

    fn open_register<D: Draft>(&self, scope: ScopePolicy) -> Register<D::Entry, D> {
        let (list, worker) = SyncWorker::<D::Entry>::spawn(
            Arc::clone(&self.store),
            self.config.namespace.clone(),
            scope,
            self.identity.watch(),
            self.notices.clone(),
        );
        let form = FormController::new(
            Arc::clone(&self.store),
            self.config.namespace.clone(),
            scope,
            self.identity.watch(),
            self.notices.clone(),
        );
        let deletion = DeletionWorkflow::new(
            Arc::clone(&self.store),
            self.config.namespace.clone(),
            scope,
            self.identity.watch(),
            self.notices.clone(),
        );
        Register {
            list,
            form,
            deletion,
            worker,
        }
    }
}

/// Everything the view layer binds to for one entity type: the synchronized
/// list, the draft form, and the deletion state machine, all feeding the
/// desk's shared notification slot.
pub struct Register<E: Entry, D: Draft<Entry = E>> {
    pub list: LiveList<E>,
    pub form: FormController<D>,
    pub deletion: DeletionWorkflow<E>,
    worker: JoinHandle<()>,
}

impl<E: Entry, D: Draft<Entry = E>> Register<E, D> {
    /// Filtered view over the synchronized list.
    pub fn filtered(&self, query: &str) -> Vec<E> {
        self.list.filtered(query)
    }

    /// Open the deletion confirmation for an entry of the current list.
    pub fn request_delete(&mut self, id: &RecordId) -> Result<()> {
        let entries = self.list.current();
        self.deletion.request_delete(id, &entries)
    }
}

impl<E: Entry, D: Draft<Entry = E>> Drop for Register<E, D> {
    // Disposing a register tears its subscription down with it.
    fn drop(&mut self) {
        self.worker.abort();
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::auth::{AuthResult, Identity};
    use crate::error::Error;
    use crate::store::MemoryStore;

    use super::*;

    struct AnonymousProvider;

    #[async_trait]
    impl IdentityProvider for AnonymousProvider {
        async fn sign_in_with_token(&self, _token: &str) -> AuthResult<Identity> {
            Ok(Identity::new("token-user"))
        }

        async fn sign_in_anonymously(&self) -> AuthResult<Identity> {
            Ok(Identity::new("anon-user"))
        }
    }

    #[test]
    fn rejects_invalid_configuration() {
        let config = DeskConfig {
            namespace: String::new(),
            ..DeskConfig::default()
        };
        let result = Desk::new(
            Arc::new(MemoryStore::new()),
            Arc::new(AnonymousProvider),
            config,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn registers_share_one_identity_and_notifier() {
        let desk = Desk::new(
            Arc::new(MemoryStore::new()),
            Arc::new(AnonymousProvider),
            DeskConfig::default(),
        )
        .unwrap();

        let state = desk.resolve_identity().await;
        assert_eq!(
            state.identity().map(|identity| identity.id.as_str()),
            Some("anon-user")
        );

        let visits = desk.visits();
        let residents = desk.residents();
        assert!(visits.form.can_submit());
        assert!(residents.form.can_submit());
        assert!(desk.notices().current().is_none());
    }

    #[tokio::test]
    async fn configured_token_wins_over_anonymous() {
        let config = DeskConfig {
            auth_token: Some("issued-token".to_string()),
            ..DeskConfig::default()
        };
        let desk = Desk::new(
            Arc::new(MemoryStore::new()),
            Arc::new(AnonymousProvider),
            config,
        )
        .unwrap();

        let state = desk.resolve_identity().await;
        assert_eq!(
            state.identity().map(|identity| identity.id.as_str()),
            Some("token-user")
        );
    }
}
