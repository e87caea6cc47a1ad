//! Accumulates paged search results for one active query at a time.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::models::SearchResponse;
use crate::data_models::Book;
use crate::error::ClientError;

pub const PAGE_SIZE: u32 = 20;

#[async_trait]
pub trait SearchSource: Send + Sync {
    async fn search_books(
        &self,
        query: &str,
        max_results: u32,
        start_index: u32,
    ) -> Result<SearchResponse, ClientError>;
}

#[async_trait]
impl<S: SearchSource + ?Sized> SearchSource for Arc<S> {
    async fn search_books(
        &self,
        query: &str,
        max_results: u32,
        start_index: u32,
    ) -> Result<SearchResponse, ClientError> {
        (**self).search_books(query, max_results, start_index).await
    }
}

/// Books accumulated so far for `query`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResultPage {
    pub query: String,
    pub books: Vec<Book>,
    pub total_items: u64,
}

impl SearchResultPage {
    pub fn has_more(&self) -> bool {
        (self.books.len() as u64) < self.total_items
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoQuery,
    InFlight,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Loaded { appended: usize },
    /// The page belonged to a query that is no longer active and was dropped.
    Stale,
    Skipped(SkipReason),
}

#[derive(Debug, Default)]
struct PagerState {
    page: Option<SearchResultPage>,
    // bumped on every `search`, so a repeated query still invalidates old pages
    generation: u64,
    in_flight: bool,
}

struct Ticket {
    generation: u64,
    query: String,
}

fn lock(state: &Mutex<PagerState>) -> MutexGuard<'_, PagerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears `in_flight` if the request future is dropped before it settles,
/// e.g. when the caller times out or aborts the task.
struct FlightGuard<'a> {
    state: &'a Mutex<PagerState>,
    generation: u64,
    armed: bool,
}

impl<'a> FlightGuard<'a> {
    fn new(state: &'a Mutex<PagerState>, generation: u64) -> Self {
        Self {
            state,
            generation,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock(self.state);
        if state.generation == self.generation {
            state.in_flight = false;
        }
    }
}

pub struct SearchPager<S> {
    source: S,
    page_size: u32,
    state: Mutex<PagerState>,
}

impl<S: SearchSource> SearchPager<S> {
    pub fn new(source: S) -> Self {
        Self::with_page_size(source, PAGE_SIZE)
    }

    pub fn with_page_size(source: S, page_size: u32) -> Self {
        Self {
            source,
            page_size,
            state: Mutex::new(PagerState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, PagerState> {
        lock(&self.state)
    }

    /// Start a new query. Prior results are dropped before the request goes
    /// out.
    pub async fn search(&self, query: &str) -> Result<PageOutcome, ClientError> {
        let ticket = {
            let mut state = self.state();
            state.generation += 1;
            state.in_flight = true;
            state.page = Some(SearchResultPage {
                query: query.to_string(),
                ..SearchResultPage::default()
            });
            Ticket {
                generation: state.generation,
                query: query.to_string(),
            }
        };

        let guard = FlightGuard::new(&self.state, ticket.generation);
        let result = self.source.search_books(query, self.page_size, 0).await;
        guard.disarm();
        self.settle(ticket, result)
    }

    /// Fetch the next page of the active query, starting at the number of
    /// books already held. Single-flight: skipped while any page is loading.
    pub async fn load_more(&self) -> Result<PageOutcome, ClientError> {
        let (ticket, start_index) = {
            let mut state = self.state();
            let Some(page) = state.page.as_ref() else {
                return Ok(PageOutcome::Skipped(SkipReason::NoQuery));
            };
            if state.in_flight {
                return Ok(PageOutcome::Skipped(SkipReason::InFlight));
            }
            if !page.has_more() {
                return Ok(PageOutcome::Skipped(SkipReason::Exhausted));
            }
            let start_index = u32::try_from(page.books.len()).unwrap_or(u32::MAX);
            let query = page.query.clone();
            state.in_flight = true;
            (
                Ticket {
                    generation: state.generation,
                    query,
                },
                start_index,
            )
        };

        let guard = FlightGuard::new(&self.state, ticket.generation);
        let result = self
            .source
            .search_books(&ticket.query, self.page_size, start_index)
            .await;
        guard.disarm();
        self.settle(ticket, result)
    }

    fn settle(
        &self,
        ticket: Ticket,
        result: Result<SearchResponse, ClientError>,
    ) -> Result<PageOutcome, ClientError> {
        let mut state = self.state();
        let is_current = state.generation == ticket.generation
            && state.page.as_ref().map(|p| p.query.as_str()) == Some(ticket.query.as_str());
        if !is_current {
            tracing::debug!(query = %ticket.query, "discarding page for inactive query");
            return Ok(PageOutcome::Stale);
        }

        state.in_flight = false;
        let response = result?;
        let Some(page) = state.page.as_mut() else {
            return Ok(PageOutcome::Stale);
        };

        let appended = response.books.len();
        page.books.extend(response.books);
        page.total_items = response.total_items;
        if appended == 0 {
            // provider totals are estimates; an empty page ends the sequence
            page.total_items = page.books.len() as u64;
        }
        Ok(PageOutcome::Loaded { appended })
    }

    pub fn snapshot(&self) -> Option<SearchResultPage> {
        self.state().page.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().in_flight
    }

    pub fn has_more(&self) -> bool {
        self.state()
            .page
            .as_ref()
            .is_some_and(SearchResultPage::has_more)
    }
}
