//! Popular books: a fixed list of canned provider queries tried in order
//! until one succeeds. Never fails; exhaustion yields an empty, annotated
//! result.

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::data_models::Book;
use crate::error::UpstreamError;
use crate::normalizer::{FieldSet, normalize_list};
use crate::upstream::{BooksApi, VolumeQuery};

pub const POPULAR_QUERIES: [&str; 4] = ["subject:fiction", "harry potter", "bestseller", "novel"];
pub const BACKOFF_INTERVAL: Duration = Duration::from_secs(1);
/// Provider maximum for `maxResults`.
pub const MAX_POPULAR_RESULTS: u32 = 40;

pub const RATE_LIMITED_ERROR: &str = "Popular books temporarily unavailable due to rate limiting";
pub const GENERIC_ERROR: &str = "Failed to fetch popular books";

/// Pause between failed attempts.
pub type Backoff = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

pub fn tokio_backoff() -> Backoff {
    Arc::new(|interval| Box::pin(tokio::time::sleep(interval)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    Try(&'a str),
    Exhausted,
}

/// What attempt `attempt` of the sequence should do.
pub fn step(queries: &[String], attempt: usize) -> Step<'_> {
    match queries.get(attempt) {
        Some(query) => Step::Try(query),
        None => Step::Exhausted,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopularBooks {
    pub books: Vec<Book>,
    pub error: Option<String>,
    pub details: Option<String>,
}

impl PopularBooks {
    fn exhausted(last_error: Option<UpstreamError>) -> Self {
        let (error, details) = match last_error {
            Some(e) if e.status() == Some(503) => (
                RATE_LIMITED_ERROR,
                "The book provider is rate limiting requests. Please try again later.".to_string(),
            ),
            Some(e) => (GENERIC_ERROR, e.to_string()),
            None => (GENERIC_ERROR, "no fallback queries configured".to_string()),
        };
        PopularBooks {
            books: Vec::new(),
            error: Some(error.to_string()),
            details: Some(details),
        }
    }
}

pub struct PopularSequencer {
    api: Arc<dyn BooksApi>,
    queries: Vec<String>,
    backoff_interval: Duration,
    backoff: Backoff,
    latency_budget: Duration,
}

impl PopularSequencer {
    pub fn new(api: Arc<dyn BooksApi>, latency_budget: Duration) -> Self {
        Self {
            api,
            queries: POPULAR_QUERIES.iter().map(|q| q.to_string()).collect(),
            backoff_interval: BACKOFF_INTERVAL,
            backoff: tokio_backoff(),
            latency_budget,
        }
    }

    pub fn with_queries(mut self, queries: Vec<String>) -> Self {
        self.queries = queries;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub async fn fetch(&self, max_results: u32) -> PopularBooks {
        let max_results = max_results.clamp(1, MAX_POPULAR_RESULTS);
        let started = Instant::now();
        let mut last_error = None;
        let mut attempt = 0;

        while let Step::Try(q) = step(&self.queries, attempt) {
            if attempt > 0 {
                (self.backoff)(self.backoff_interval).await;
            }

            let remaining = self.latency_budget.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                warn!(attempt, "popular books latency budget spent");
                last_error.get_or_insert(UpstreamError::Timeout);
                break;
            }

            let query = VolumeQuery::new(q, max_results).order_by("relevance");
            match tokio::time::timeout(remaining, self.api.list_volumes(&query)).await {
                Ok(Ok(list)) => {
                    info!(query = q, attempt, "popular books served");
                    return PopularBooks {
                        books: normalize_list(&list, FieldSet::Listing),
                        ..PopularBooks::default()
                    };
                }
                Ok(Err(e)) => {
                    warn!(query = q, attempt, status = ?e.status(), "popular query failed: {e}");
                    last_error = Some(e);
                }
                Err(_) => {
                    warn!(query = q, attempt, "popular books latency budget spent");
                    // a provider answer, if any, says more than the cut-off
                    last_error.get_or_insert(UpstreamError::Timeout);
                    break;
                }
            }
            attempt += 1;
        }

        PopularBooks::exhausted(last_error)
    }
}
