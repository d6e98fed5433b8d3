//! Visit record model: a visiting company or service provider.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::Identity;
use crate::error::{Error, Result};
use crate::form::Draft;
use crate::models::{Entry, FieldMap, RawRecord, RecordId};
use crate::util::{format_wall_clock, normalize_text_option};

/// A registered visit (company/service provider with date, time and note).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    /// Store-assigned identifier
    pub id: RecordId,
    /// Company or service-provider name
    pub company: String,
    /// Scheduled service date (wall clock, no zone)
    pub service_date: NaiveDate,
    /// Scheduled service time (wall clock, no zone)
    pub service_time: NaiveTime,
    /// Optional free-text note; absent when the form left it empty
    pub note: Option<String>,
    /// Identity id of the creator, when recorded
    pub created_by: Option<String>,
    /// Server-assigned creation timestamp; absent momentarily between a
    /// local create and the server's confirmation
    pub created_at: Option<DateTime<Utc>>,
}

impl VisitRecord {
    /// The visit's own date+time as one wall-clock instant.
    #[must_use]
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.service_date.and_time(self.service_time)
    }
}

impl Entry for VisitRecord {
    const COLLECTION: &'static str = "visits";

    fn from_record(record: &RawRecord) -> Option<Self> {
        let company = record.text("company")?;
        let service_date =
            NaiveDate::parse_from_str(&record.text("serviceDate")?, "%Y-%m-%d").ok()?;
        let service_time = NaiveTime::parse_from_str(&record.text("serviceTime")?, "%H:%M").ok()?;

        Some(Self {
            id: record.id.clone(),
            company,
            service_date,
            service_time,
            note: record.text("note"),
            created_by: record.text("createdBy"),
            created_at: record
                .integer("createdAt")
                .and_then(DateTime::from_timestamp_millis),
        })
    }

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn recency(&self) -> Option<NaiveDateTime> {
        self.created_at
            .map(|at| at.naive_utc())
            .or_else(|| Some(self.scheduled_at()))
    }

    fn label(&self) -> String {
        format!(
            "{} ({})",
            self.company,
            format_wall_clock(self.scheduled_at())
        )
    }

    fn search_text(&self) -> String {
        let mut text = self.company.clone();
        if let Some(note) = &self.note {
            text.push(' ');
            text.push_str(note);
        }
        text.push(' ');
        text.push_str(&format_wall_clock(self.scheduled_at()));
        text
    }
}

/// In-progress, unsaved visit form values.
///
/// Defaults to today's date and the current local time (to the minute) so a
/// fresh form is one company name away from a valid submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitDraft {
    pub company: String,
    pub service_date: Option<NaiveDate>,
    pub service_time: Option<NaiveTime>,
    pub note: String,
}

impl Default for VisitDraft {
    fn default() -> Self {
        let now = Local::now().naive_local();
        Self {
            company: String::new(),
            service_date: Some(now.date()),
            service_time: NaiveTime::from_hms_opt(now.hour(), now.minute(), 0),
            note: String::new(),
        }
    }
}

impl Draft for VisitDraft {
    type Entry = VisitRecord;

    fn validate(&self) -> Result<()> {
        if self.company.trim().is_empty() {
            return Err(Error::Validation("company"));
        }
        if self.service_date.is_none() {
            return Err(Error::Validation("serviceDate"));
        }
        if self.service_time.is_none() {
            return Err(Error::Validation("serviceTime"));
        }
        Ok(())
    }

    fn fields(&self, creator: &Identity) -> Result<FieldMap> {
        self.validate()?;
        let (Some(service_date), Some(service_time)) = (self.service_date, self.service_time)
        else {
            return Err(Error::Validation("serviceDate"));
        };

        let mut fields = FieldMap::new();
        fields.insert("company".to_string(), json!(self.company.trim()));
        fields.insert(
            "serviceDate".to_string(),
            json!(service_date.format("%Y-%m-%d").to_string()),
        );
        fields.insert(
            "serviceTime".to_string(),
            json!(service_time.format("%H:%M").to_string()),
        );
        if let Some(note) = normalize_text_option(Some(self.note.clone())) {
            fields.insert("note".to_string(), json!(note));
        }
        fields.insert("createdBy".to_string(), json!(creator.id));
        Ok(fields)
    }
}
