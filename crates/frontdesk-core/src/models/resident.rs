//! Resident record model: a resident registered by name, block and apartment.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::Identity;
use crate::error::{Error, Result};
use crate::form::Draft;
use crate::models::{Entry, FieldMap, RawRecord, RecordId};

/// A registered resident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentRecord {
    /// Store-assigned identifier
    pub id: RecordId,
    pub name: String,
    pub block: String,
    pub apartment: String,
    /// Identity id of the creator, when recorded
    pub created_by: Option<String>,
    /// Server-assigned creation timestamp
    pub created_at: Option<DateTime<Utc>>,
}

impl Entry for ResidentRecord {
    const COLLECTION: &'static str = "residents";

    fn from_record(record: &RawRecord) -> Option<Self> {
        Some(Self {
            id: record.id.clone(),
            name: record.text("name")?,
            block: record.text("block")?,
            apartment: record.text("apartment")?,
            created_by: record.text("createdBy"),
            created_at: record
                .integer("createdAt")
                .and_then(DateTime::from_timestamp_millis),
        })
    }

    fn id(&self) -> &RecordId {
        &self.id
    }

    // Residents have no domain timestamp; an unstamped record sorts last
    // until the server confirms it.
    fn recency(&self) -> Option<NaiveDateTime> {
        self.created_at.map(|at| at.naive_utc())
    }

    fn label(&self) -> String {
        format!("{} ({}/{})", self.name, self.block, self.apartment)
    }

    fn search_text(&self) -> String {
        format!("{} {} {}", self.name, self.block, self.apartment)
    }
}

/// In-progress, unsaved resident form values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResidentDraft {
    pub name: String,
    pub block: String,
    pub apartment: String,
}

impl Draft for ResidentDraft {
    type Entry = ResidentRecord;

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("name"));
        }
        if self.block.trim().is_empty() {
            return Err(Error::Validation("block"));
        }
        if self.apartment.trim().is_empty() {
            return Err(Error::Validation("apartment"));
        }
        Ok(())
    }

    fn fields(&self, creator: &Identity) -> Result<FieldMap> {
        self.validate()?;
        let mut fields = FieldMap::new();
        fields.insert("name".to_string(), json!(self.name.trim()));
        fields.insert("block".to_string(), json!(self.block.trim()));
        fields.insert("apartment".to_string(), json!(self.apartment.trim()));
        fields.insert("createdBy".to_string(), json!(creator.id));
        Ok(fields)
    }
}
