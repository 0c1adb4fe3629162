//! Search orchestration: remote first, local matcher as fallback, newest query wins.
//!
//! A search is split at its one suspension point so hosts can run the network
//! call wherever they like (inline, or in a spawned task that posts back to
//! an event loop):
//!
//! 1. [`QueryDispatcher::submit`] stamps the query with a sequence number.
//! 2. [`SearchRequest::execute`] performs the remote call.
//! 3. [`QueryDispatcher::resolve`] checks freshness, falls back if needed, and
//!    applies the result.
//!
//! Results are never cancelled; a superseded response is simply dropped at
//! step 3.

use tracing::{debug, warn};

use crate::catalog::{CatalogCache, CatalogSnapshot};
use crate::client::CatalogBackend;
use crate::error::StoreError;
use crate::matcher::{self, is_blank};
use crate::model::AppRecord;

/// A submitted query waiting for its remote call
#[derive(Debug, Clone)]
pub struct SearchRequest {
    seq: u64,
    query: String,
}

impl SearchRequest {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Run the remote call. A blank query asks for the full catalog.
    pub async fn execute<B>(self, backend: &B) -> SearchResponse
    where
        B: CatalogBackend + ?Sized,
    {
        let outcome = if is_blank(&self.query) {
            backend.fetch_catalog().await
        } else {
            backend.search(&self.query).await
        };

        SearchResponse {
            seq: self.seq,
            query: self.query,
            outcome,
        }
    }
}

/// Outcome of a remote search call, not yet applied
#[derive(Debug)]
pub struct SearchResponse {
    pub seq: u64,
    pub query: String,
    pub outcome: Result<Vec<AppRecord>, StoreError>,
}

/// Which path produced the visible results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Remote,
    LocalFallback,
}

/// What `resolve` did with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied { source: ResultSource, count: usize },
    /// A newer query was submitted; the response was discarded
    Stale { seq: u64, latest: u64 },
}

#[derive(Debug, Default)]
pub struct QueryDispatcher {
    cache: CatalogCache,
    latest_seq: u64,
    visible: Vec<AppRecord>,
    source: Option<ResultSource>,
}

impl QueryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, query: impl Into<String>) -> SearchRequest {
        self.latest_seq += 1;
        let query = query.into();
        debug!(seq = self.latest_seq, query = %query, "search submitted");

        SearchRequest {
            seq: self.latest_seq,
            query,
        }
    }

    pub fn resolve(&mut self, response: SearchResponse) -> Resolution {
        let SearchResponse {
            seq,
            query,
            outcome,
        } = response;

        if seq != self.latest_seq {
            debug!(seq, latest = self.latest_seq, "dropping stale search result");
            return Resolution::Stale {
                seq,
                latest: self.latest_seq,
            };
        }

        let (results, source) = match outcome {
            Ok(results) => {
                if is_blank(&query) {
                    // A blank query fetched the whole catalog, so it doubles as a refresh
                    self.cache.set(CatalogSnapshot::new(results.clone()));
                }
                (results, ResultSource::Remote)
            }
            Err(err) => {
                warn!(
                    seq,
                    query = %query,
                    error = %err,
                    "remote search failed, using local matcher"
                );
                (
                    matcher::match_apps_owned(&query, self.cache.records()),
                    ResultSource::LocalFallback,
                )
            }
        };

        let count = results.len();
        self.visible = results;
        self.source = Some(source);
        debug!(seq, count, ?source, "search results applied");

        Resolution::Applied { source, count }
    }

    /// Submit, execute, and resolve in one go
    pub async fn search<B>(&mut self, backend: &B, query: impl Into<String>) -> Resolution
    where
        B: CatalogBackend + ?Sized,
    {
        let request = self.submit(query);
        let response = request.execute(backend).await;
        self.resolve(response)
    }

    /// Load a freshly fetched catalog into the cache.
    ///
    /// Until the first query is submitted, the full catalog is what's visible.
    pub fn refresh_catalog(&mut self, records: Vec<AppRecord>) {
        if self.latest_seq == 0 {
            self.visible = records.clone();
            self.source = Some(ResultSource::Remote);
        }
        self.cache.set(CatalogSnapshot::new(records));
    }

    pub fn visible(&self) -> &[AppRecord] {
        &self.visible
    }

    pub fn source(&self) -> Option<ResultSource> {
        self.source
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::tests::app;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend with canned answers per query; `None` means the call fails
    struct CannedBackend {
        catalog: Option<Vec<AppRecord>>,
        answers: HashMap<String, Vec<AppRecord>>,
        calls: AtomicUsize,
    }

    impl CannedBackend {
        fn down() -> Self {
            Self {
                catalog: None,
                answers: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn up(catalog: Vec<AppRecord>) -> Self {
            Self {
                catalog: Some(catalog),
                answers: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn answer(mut self, query: &str, results: Vec<AppRecord>) -> Self {
            self.answers.insert(query.to_string(), results);
            self
        }

        fn unavailable() -> StoreError {
            StoreError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: String::new(),
            }
        }
    }

    #[async_trait]
    impl CatalogBackend for CannedBackend {
        async fn fetch_catalog(&self) -> Result<Vec<AppRecord>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.catalog.clone().ok_or_else(Self::unavailable)
        }

        async fn search(&self, query: &str) -> Result<Vec<AppRecord>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.catalog.is_none() {
                return Err(Self::unavailable());
            }
            Ok(self.answers.get(query).cloned().unwrap_or_default())
        }
    }

    fn two_app_catalog() -> Vec<AppRecord> {
        vec![
            app("1", "SuperGame", "Games", "Arcade fun"),
            app("2", "TaxHelper", "Productivity", "File your taxes"),
        ]
    }

    fn visible_ids(dispatcher: &QueryDispatcher) -> Vec<&str> {
        dispatcher.visible().iter().map(|a| a.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_remote_result_applied() {
        let catalog = two_app_catalog();
        let backend = CannedBackend::up(catalog.clone()).answer("game", vec![catalog[0].clone()]);
        let mut dispatcher = QueryDispatcher::new();
        dispatcher.refresh_catalog(catalog);

        let resolution = dispatcher.search(&backend, "game").await;
        assert_eq!(
            resolution,
            Resolution::Applied {
                source: ResultSource::Remote,
                count: 1
            }
        );
        assert_eq!(visible_ids(&dispatcher), vec!["1"]);
    }

    #[tokio::test]
    async fn test_fallback_when_remote_unreachable() {
        let backend = CannedBackend::down();
        let mut dispatcher = QueryDispatcher::new();
        dispatcher.refresh_catalog(two_app_catalog());

        let resolution = dispatcher.search(&backend, "game").await;
        assert_eq!(
            resolution,
            Resolution::Applied {
                source: ResultSource::LocalFallback,
                count: 1
            }
        );
        let expected = matcher::match_apps_owned("game", dispatcher.cache().records());
        assert_eq!(dispatcher.visible(), expected.as_slice());
        assert_eq!(dispatcher.source(), Some(ResultSource::LocalFallback));
    }

    #[tokio::test]
    async fn test_blank_query_returns_full_catalog_on_both_paths() {
        let catalog = two_app_catalog();

        let up = CannedBackend::up(catalog.clone());
        let mut remote = QueryDispatcher::new();
        remote.refresh_catalog(catalog.clone());
        remote.search(&up, "game").await;
        remote.search(&up, "").await;
        assert_eq!(remote.visible(), catalog.as_slice());
        assert_eq!(remote.source(), Some(ResultSource::Remote));

        let down = CannedBackend::down();
        let mut local = QueryDispatcher::new();
        local.refresh_catalog(catalog.clone());
        local.search(&down, "  ").await;
        assert_eq!(local.visible(), catalog.as_slice());
        assert_eq!(local.source(), Some(ResultSource::LocalFallback));
    }

    #[tokio::test]
    async fn test_older_response_arriving_late_is_dropped() {
        let catalog = two_app_catalog();
        let backend = CannedBackend::up(catalog.clone())
            .answer("game", vec![catalog[0].clone()])
            .answer("tax", vec![catalog[1].clone()]);
        let mut dispatcher = QueryDispatcher::new();
        dispatcher.refresh_catalog(catalog);

        let a = dispatcher.submit("game");
        let b = dispatcher.submit("tax");
        let a_seq = a.seq();

        // B resolves first, then A's late response arrives
        let b_response = b.execute(&backend).await;
        let a_response = a.execute(&backend).await;

        assert!(matches!(
            dispatcher.resolve(b_response),
            Resolution::Applied { .. }
        ));
        assert_eq!(
            dispatcher.resolve(a_response),
            Resolution::Stale {
                seq: a_seq,
                latest: 2
            }
        );
        assert_eq!(visible_ids(&dispatcher), vec!["2"]);
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_fall_back() {
        let catalog = two_app_catalog();
        let backend = CannedBackend::up(catalog.clone()).answer("tax", vec![catalog[1].clone()]);
        let mut dispatcher = QueryDispatcher::new();
        dispatcher.refresh_catalog(catalog);

        let a = dispatcher.submit("game");
        let b = dispatcher.submit("tax");
        dispatcher.resolve(b.execute(&backend).await);

        let failed = SearchResponse {
            seq: a.seq(),
            query: a.query().to_string(),
            outcome: Err(CannedBackend::unavailable()),
        };
        assert!(matches!(
            dispatcher.resolve(failed),
            Resolution::Stale { .. }
        ));
        assert_eq!(visible_ids(&dispatcher), vec!["2"]);
        assert_eq!(dispatcher.source(), Some(ResultSource::Remote));
    }

    #[tokio::test]
    async fn test_blank_query_refreshes_cache() {
        let backend = CannedBackend::up(two_app_catalog());
        let mut dispatcher = QueryDispatcher::new();
        assert!(dispatcher.cache().records().is_empty());

        dispatcher.search(&backend, "").await;
        assert_eq!(dispatcher.cache().records().len(), 2);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_with_empty_cache_yields_nothing() {
        let backend = CannedBackend::down();
        let mut dispatcher = QueryDispatcher::new();

        let resolution = dispatcher.search(&backend, "game").await;
        assert_eq!(
            resolution,
            Resolution::Applied {
                source: ResultSource::LocalFallback,
                count: 0
            }
        );
    }

    #[test]
    fn test_refresh_after_first_query_keeps_visible() {
        let mut dispatcher = QueryDispatcher::new();
        dispatcher.refresh_catalog(two_app_catalog());
        assert_eq!(dispatcher.visible().len(), 2);

        let request = dispatcher.submit("tax");
        dispatcher.resolve(SearchResponse {
            seq: request.seq(),
            query: request.query().to_string(),
            outcome: Ok(vec![]),
        });
        dispatcher.refresh_catalog(vec![app("3", "Notes", "Productivity", "")]);

        assert!(dispatcher.visible().is_empty());
        assert_eq!(dispatcher.cache().records()[0].id, "3");
    }
}
