use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::models::{PopularResponse, RecommendationsResponse, SearchResponse};
use crate::data_models::Book;
use crate::error::ClientError;

use super::pagination::SearchSource;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP wrapper over the `/api` surface. Every failure collapses into the
/// fixed [`ClientError`] for that endpoint; the cause is only logged.
#[derive(Debug, Clone)]
pub struct BookService {
    http: reqwest::Client,
    base_url: Url,
}

impl BookService {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(CLIENT_TIMEOUT).build()?;
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("api url cannot carry a path: {base_url}");
        }
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, reqwest::Error> {
        self.http
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn search_books(
        &self,
        query: &str,
        max_results: u32,
        start_index: u32,
    ) -> Result<SearchResponse, ClientError> {
        let params = [
            ("q", query.to_string()),
            ("maxResults", max_results.to_string()),
            ("startIndex", start_index.to_string()),
        ];
        self.get_json(self.endpoint(&["books", "search"]), &params)
            .await
            .map_err(|e| {
                tracing::error!("Error searching books: {e}");
                ClientError::Search
            })
    }

    pub async fn get_book_by_id(&self, id: &str) -> Result<Book, ClientError> {
        self.get_json(self.endpoint(&["books", id]), &[])
            .await
            .map_err(|e| {
                tracing::error!("Error fetching book: {e}");
                ClientError::BookDetails
            })
    }

    pub async fn get_recommendations(
        &self,
        category: &str,
        max_results: u32,
    ) -> Result<RecommendationsResponse, ClientError> {
        let params = [
            ("category", category.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        self.get_json(self.endpoint(&["books", "recommendations"]), &params)
            .await
            .map_err(|e| {
                tracing::error!("Error fetching recommendations: {e}");
                ClientError::Recommendations
            })
    }

    pub async fn get_popular_books(&self, max_results: u32) -> Result<PopularResponse, ClientError> {
        let params = [("maxResults", max_results.to_string())];
        self.get_json(self.endpoint(&["books", "popular"]), &params)
            .await
            .map_err(|e| {
                tracing::error!("Error fetching popular books: {e}");
                ClientError::Popular
            })
    }
}

#[async_trait]
impl SearchSource for BookService {
    async fn search_books(
        &self,
        query: &str,
        max_results: u32,
        start_index: u32,
    ) -> Result<SearchResponse, ClientError> {
        BookService::search_books(self, query, max_results, start_index).await
    }
}
