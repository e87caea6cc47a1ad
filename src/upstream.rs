use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;

use crate::data_models::{VolumeItem, VolumeList};
use crate::error::UpstreamError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Parameters for a provider volume listing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VolumeQuery {
    pub q: String,
    pub max_results: u32,
    pub start_index: Option<u32>,
    pub order_by: Option<&'static str>,
}

impl VolumeQuery {
    pub fn new(q: impl Into<String>, max_results: u32) -> Self {
        Self {
            q: q.into(),
            max_results,
            ..Self::default()
        }
    }

    pub fn start_index(mut self, start_index: u32) -> Self {
        self.start_index = Some(start_index);
        self
    }

    pub fn order_by(mut self, order_by: &'static str) -> Self {
        self.order_by = Some(order_by);
        self
    }
}

/// The book-metadata provider. No retries at this layer: any error is final
/// for the call that produced it.
#[async_trait]
pub trait BooksApi: Send + Sync {
    async fn list_volumes(&self, query: &VolumeQuery) -> Result<VolumeList, UpstreamError>;

    async fn get_volume(&self, id: &str) -> Result<VolumeItem, UpstreamError>;
}

/// [`BooksApi`] over the Google Books volumes endpoint.
#[derive(Debug, Clone)]
pub struct GoogleBooksClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl GoogleBooksClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("provider url cannot carry a path: {base_url}");
        }
        if api_key.is_none() {
            log::warn!("GOOGLE_BOOKS_API_KEY is not set, provider quota will be shared");
        }
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn volume_url(&self, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }
        url
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, UpstreamError> {
        let request = match &self.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::Transport(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            log::error!(
                "provider returned {status}, api key present: {}, body: {body}",
                self.api_key.is_some()
            );
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl BooksApi for GoogleBooksClient {
    async fn list_volumes(&self, query: &VolumeQuery) -> Result<VolumeList, UpstreamError> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.q.clone()),
            ("maxResults", query.max_results.to_string()),
        ];
        if let Some(start) = query.start_index {
            params.push(("startIndex", start.to_string()));
        }
        if let Some(order_by) = query.order_by {
            params.push(("orderBy", order_by.to_string()));
        }

        log::debug!("listing volumes: {params:?}");
        self.fetch(self.http.get(self.base_url.clone()).query(&params))
            .await
    }

    async fn get_volume(&self, id: &str) -> Result<VolumeItem, UpstreamError> {
        let url = self.volume_url(id);
        log::debug!("fetching volume {id}");
        self.fetch(self.http.get(url)).await
    }
}
