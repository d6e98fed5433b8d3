//! Shared utility functions used across multiple modules.

use chrono::NaiveDateTime;

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Render a wall-clock instant as `dd/mm/yyyy HH:MM` for labels and search.
pub fn format_wall_clock(instant: NaiveDateTime) -> String {
    instant.format("%d/%m/%Y %H:%M").to_string()
}
