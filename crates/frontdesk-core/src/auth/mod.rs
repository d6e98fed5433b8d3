//! Identity provider adapter.
//!
//! Wraps a black-box identity provider (token or anonymous sign-in) behind an
//! explicit state stream. Downstream components distinguish "identity not yet
//! resolved" from "no identity": operations are suspended while unresolved
//! and disabled once signed out.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::util::normalize_text_option;

/// An opaque user identity issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
}

impl Identity {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Resolution state of the current identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityState {
    /// Startup: resolution has not completed yet. Identity-requiring
    /// operations are suspended, not attempted and not queued.
    #[default]
    Unresolved,
    SignedIn(Identity),
    /// Resolution completed without an identity (sign-out or auth failure).
    SignedOut,
}

impl IdentityState {
    /// The resolved identity, when signed in.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::Unresolved | Self::SignedOut => None,
        }
    }

    /// Whether the initial resolution has completed (in either direction).
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Credential token rejected: {0}")]
    TokenRejected(String),
    #[error("Identity provider error: {0}")]
    Provider(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Black-box identity provider consumed by the adapter.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_token(&self, token: &str) -> AuthResult<Identity>;
    async fn sign_in_anonymously(&self) -> AuthResult<Identity>;
}

/// Resolves and publishes the current identity.
///
/// The state stream starts at `Unresolved` and moves exactly once per
/// `resolve()` call, then on every `sign_out()`.
#[derive(Clone)]
pub struct IdentityAdapter {
    provider: Arc<dyn IdentityProvider>,
    token: Option<String>,
    tx: Arc<watch::Sender<IdentityState>>,
}

impl IdentityAdapter {
    /// Create an adapter over the given provider.
    ///
    /// A blank credential token is treated as absent.
    pub fn new(provider: Arc<dyn IdentityProvider>, token: Option<String>) -> Self {
        let (tx, _rx) = watch::channel(IdentityState::Unresolved);
        Self {
            provider,
            token: normalize_text_option(token),
            tx: Arc::new(tx),
        }
    }

    /// Subscribe to identity-state changes (including the initial resolution).
    pub fn watch(&self) -> watch::Receiver<IdentityState> {
        self.tx.subscribe()
    }

    /// Current identity state.
    pub fn state(&self) -> IdentityState {
        self.tx.borrow().clone()
    }

    /// Attempt authentication: the configured token first, anonymous as the
    /// fallback. Failure leaves the identity signed out; the caller renders
    /// an unauthenticated affordance instead of silently failing writes.
    pub async fn resolve(&self) -> IdentityState {
        let result = match &self.token {
            Some(token) => match self.provider.sign_in_with_token(token).await {
                Ok(identity) => Ok(identity),
                Err(error) => {
                    tracing::warn!(
                        "Token sign-in failed, falling back to anonymous: {}",
                        error
                    );
                    self.provider.sign_in_anonymously().await
                }
            },
            None => self.provider.sign_in_anonymously().await,
        };

        let state = match result {
            Ok(identity) => IdentityState::SignedIn(identity),
            Err(error) => {
                tracing::error!("Authentication failed: {}", error);
                IdentityState::SignedOut
            }
        };
        self.tx.send_replace(state.clone());
        state
    }

    /// Drop the current identity.
    pub fn sign_out(&self) {
        self.tx.send_replace(IdentityState::SignedOut);
    }
}
