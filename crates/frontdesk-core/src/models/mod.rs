//! Data models for Frontdesk

mod record;
mod resident;
mod visit;

pub use record::{sort_newest_first, Entry, FieldMap, RawRecord, RecordId};
pub use resident::{ResidentDraft, ResidentRecord};
pub use visit::{VisitDraft, VisitRecord};
