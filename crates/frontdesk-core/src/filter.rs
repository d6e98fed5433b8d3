//! Client-side list filtering helpers.

use crate::models::Entry;

/// Filter entries by a case-insensitive substring query.
///
/// The test runs over each entry's concatenated searchable fields and is
/// recomputed freshly from the full synchronized list on every call; the
/// input list is never mutated or reordered. A blank query matches
/// everything.
#[must_use]
pub fn filter_entries<E: Entry>(entries: &[E], query: &str) -> Vec<E> {
    let normalized_query = normalize_query(query);
    if normalized_query.is_empty() {
        return entries.to_vec();
    }

    entries
        .iter()
        .filter(|entry| entry.search_text().to_lowercase().contains(&normalized_query))
        .cloned()
        .collect()
}

fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use crate::models::{RecordId, VisitRecord};

    use super::*;

    fn visit(id: &str, company: &str, note: Option<&str>) -> VisitRecord {
        VisitRecord {
            id: RecordId::from(id),
            company: company.to_string(),
            service_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            service_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            note: note.map(str::to_string),
            created_by: None,
            created_at: None,
        }
    }

    #[test]
    fn matches_substrings_case_insensitively() {
        let entries = vec![visit("1", "Acme Corp", None), visit("2", "Beta Ltd", None)];

        let filtered = filter_entries(&entries, "acme");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].company, "Acme Corp");
    }

    #[test]
    fn leaves_the_underlying_list_unchanged() {
        let entries = vec![visit("1", "Acme Corp", None), visit("2", "Beta Ltd", None)];
        let _ = filter_entries(&entries, "acme");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].company, "Acme Corp");
    }

    #[test]
    fn blank_query_matches_everything() {
        let entries = vec![visit("1", "Acme Corp", None), visit("2", "Beta Ltd", None)];
        assert_eq!(filter_entries(&entries, "").len(), 2);
        assert_eq!(filter_entries(&entries, "   ").len(), 2);
    }

    #[test]
    fn searches_notes_and_formatted_datetime() {
        let entries = vec![
            visit("1", "Acme", Some("elevator maintenance")),
            visit("2", "Beta", None),
        ];

        assert_eq!(filter_entries(&entries, "ELEVATOR").len(), 1);
        // Formatted wall clock: 01/05/2024 09:00
        assert_eq!(filter_entries(&entries, "01/05/2024").len(), 2);
    }
}
