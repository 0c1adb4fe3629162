use chrono::{DateTime, Utc};

use crate::model::AppRecord;

/// A full catalog listing, stamped with when it was fetched
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    pub records: Vec<AppRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn new(records: Vec<AppRecord>) -> Self {
        Self {
            records,
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// What the cache currently holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CatalogView<'a> {
    /// Nothing has been loaded yet
    Empty,
    Loaded(&'a CatalogSnapshot),
}

/// Holds the most recently fetched catalog snapshot.
///
/// Last write wins; there is no merge, history, or expiry.
#[derive(Debug, Default)]
pub struct CatalogCache {
    snapshot: Option<CatalogSnapshot>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, snapshot: CatalogSnapshot) {
        self.snapshot = Some(snapshot);
    }

    pub fn get(&self) -> CatalogView<'_> {
        match &self.snapshot {
            Some(snapshot) => CatalogView::Loaded(snapshot),
            None => CatalogView::Empty,
        }
    }

    /// Records of the current snapshot, empty if none was ever loaded
    pub fn records(&self) -> &[AppRecord] {
        self.snapshot
            .as_ref()
            .map(|s| s.records.as_slice())
            .unwrap_or_default()
    }

    /// The first `n` records, used for the featured strip
    pub fn featured(&self, n: usize) -> &[AppRecord] {
        let records = self.records();
        &records[..n.min(records.len())]
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.as_ref().map(|s| s.fetched_at)
    }
}
