//! Error types for frontdesk-core

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using frontdesk-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in frontdesk-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// No resolved identity; blocks create/delete, never retried automatically
    #[error("Not authenticated")]
    Unauthenticated,

    /// A required form field is empty; names the offending field
    #[error("Required field is empty: {0}")]
    Validation(&'static str),

    /// Transient failure on the live listener; the previous list is retained
    #[error("Subscription error: {0}")]
    Subscription(#[source] StoreError),

    /// Create or delete rejected by the store; draft/selection preserved for retry
    #[error("Write failed: {0}")]
    Write(#[source] StoreError),

    /// Invalid startup configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}
