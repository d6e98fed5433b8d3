//! Raw record types and the typed-entry seam over the document store.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An opaque record identifier assigned by the store on creation.
///
/// Immutable and unique within a collection. The store decides the format;
/// consumers only compare and display it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Field payload of a record as the store sees it.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// One record exactly as delivered by a snapshot: id plus untyped fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: RecordId,
    pub fields: FieldMap,
}

impl RawRecord {
    #[must_use]
    pub fn new(id: RecordId, fields: FieldMap) -> Self {
        Self { id, fields }
    }

    /// Fetch a string field, trimmed, rejecting empties.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        let value = self.fields.get(field)?.as_str()?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    /// Fetch an integer field (Unix milliseconds and the like).
    #[must_use]
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.fields.get(field)?.as_i64()
    }
}

/// A typed view over the raw records of one collection.
///
/// Mapping is total per snapshot: a record that fails `from_record` is
/// dropped from the projection (and logged), never aborts it.
pub trait Entry: Clone + Send + Sync + 'static {
    /// Collection name this entry type lives in.
    const COLLECTION: &'static str;

    /// Map a raw record to a typed entry. `None` means the record is
    /// malformed for this collection.
    fn from_record(record: &RawRecord) -> Option<Self>;

    fn id(&self) -> &RecordId;

    /// Wall-clock instant used for newest-first ordering.
    ///
    /// Server `created_at` compared as UTC wall clock when present, else the
    /// entry's own date+time as a local calendar timestamp. `None` (possible
    /// only in the window before the server stamps the record) sorts last.
    /// No timezone conversion is attempted.
    fn recency(&self) -> Option<NaiveDateTime>;

    /// Human-readable label shown by the deletion confirmation dialog.
    fn label(&self) -> String;

    /// Concatenation of the searchable fields, used by the filter view.
    fn search_text(&self) -> String;
}

/// Order entries newest-first with a stable, deterministic tie-break.
///
/// Entries without a recency sort last; equal instants break by id ascending
/// so ties never flicker between renders.
pub fn sort_newest_first<E: Entry>(entries: &mut [E]) {
    entries.sort_by(|a, b| {
        b.recency()
            .cmp(&a.recency())
            .then_with(|| a.id().cmp(b.id()))
    });
}
