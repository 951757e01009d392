//! The `?search=` filter shared by the list endpoints and pages.

use serde::Deserialize;

/// The query string for filtering a list of records by their text fields.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchQuery {
    /// Only keep records with a text field that contains this text, ignoring
    /// case.
    pub search: Option<String>,
}

impl SearchQuery {
    /// The search text as typed, or an empty string.
    pub fn as_str(&self) -> &str {
        self.search.as_deref().unwrap_or_default()
    }

    /// Keep the `records` where any of the fields returned by `keys` contains
    /// the search text.
    ///
    /// An absent or blank search keeps every record.
    pub fn filter<T>(&self, records: Vec<T>, keys: impl Fn(&T) -> Vec<&str>) -> Vec<T> {
        let needle = self.as_str().trim().to_lowercase();

        if needle.is_empty() {
            return records;
        }

        records
            .into_iter()
            .filter(|record| {
                keys(record)
                    .into_iter()
                    .any(|key| key.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
