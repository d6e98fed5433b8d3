//! frontdesk-core - Core library for Frontdesk
//!
//! Client-side realtime register synchronization for a building's front
//! desk: live lists mirrored from a document store, draft forms with a
//! duplicate-submit guard, a confirmation-gated deletion workflow, a
//! single-slot notification channel, and client-side filtering. The
//! identity provider and the document store are injected behind traits.

pub mod auth;
pub mod config;
pub mod deletion;
pub mod desk;
pub mod error;
pub mod filter;
pub mod form;
pub mod models;
pub mod notify;
pub mod store;
pub mod sync;
mod util;

pub use config::{DeskConfig, ScopePolicy};
pub use desk::{Desk, Register};
pub use error::{Error, Result};
pub use models::{RecordId, ResidentRecord, VisitRecord};
