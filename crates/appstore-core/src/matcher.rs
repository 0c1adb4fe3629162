//! Client-side catalog filter used when remote search is unavailable.

use crate::model::AppRecord;

/// Returns the records whose name, category, or description contains `query`,
/// ignoring case, in their original order.
///
/// A blank query matches everything, which is what a cleared search box shows.
pub fn match_apps<'a>(query: &str, records: &'a [AppRecord]) -> Vec<&'a AppRecord> {
    if is_blank(query) {
        return records.iter().collect();
    }

    let query_lower = query.to_lowercase();

    records
        .iter()
        .filter(|app| {
            app.name.to_lowercase().contains(&query_lower)
                || app.category.to_lowercase().contains(&query_lower)
                || app.description.to_lowercase().contains(&query_lower)
        })
        .collect()
}

/// Owned variant of [`match_apps`] for callers that keep the result
pub fn match_apps_owned(query: &str, records: &[AppRecord]) -> Vec<AppRecord> {
    match_apps(query, records).into_iter().cloned().collect()
}

pub fn is_blank(query: &str) -> bool {
    query.trim().is_empty()
}
