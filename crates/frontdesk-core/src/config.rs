//! Startup configuration for the desk context.
//!
//! Everything the library needs is passed in here explicitly; nothing is
//! read from ambient environment state. Validation happens once, at
//! construction, with typed errors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::{Error, Result};

/// Fixed scope segment for records shared across all identities.
pub const SHARED_SCOPE_SEGMENT: &str = "public";

const DEFAULT_NAMESPACE: &str = "frontdesk";
const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(4);

/// How a record collection is partitioned by owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopePolicy {
    /// Records shared across all identities under a fixed public segment.
    /// Historical behavior for both visit and resident records.
    #[default]
    Shared,
    /// Records private to the resolved identity.
    PerIdentity,
}

impl ScopePolicy {
    /// The path segment for this policy under the given identity.
    #[must_use]
    pub fn segment(self, identity: &Identity) -> String {
        match self {
            Self::Shared => SHARED_SCOPE_SEGMENT.to_string(),
            Self::PerIdentity => identity.id.clone(),
        }
    }
}

/// Build-time configuration for a desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// Root path segment all collections live under
    pub namespace: String,
    /// Externally supplied credential token; absent means anonymous sign-in
    pub auth_token: Option<String>,
    pub visit_scope: ScopePolicy,
    pub resident_scope: ScopePolicy,
    /// How long a notification stays on screen before auto-dismissal
    pub notice_ttl: Duration,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            auth_token: None,
            visit_scope: ScopePolicy::default(),
            resident_scope: ScopePolicy::default(),
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }
}

impl DeskConfig {
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::Config("namespace must not be empty".to_string()));
        }
        if self.namespace.contains('/') {
            return Err(Error::Config(
                "namespace must not contain path separators".to_string(),
            ));
        }
        if self.notice_ttl.is_zero() {
            return Err(Error::Config("notice_ttl must be positive".to_string()));
        }
        Ok(())
    }
}
