use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::data_models::Book;
use crate::fallback::PopularBooks;

// Numeric params that do not parse fall back to their defaults instead of
// rejecting the whole query string.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max_results: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub start_index: Option<u32>,
}

impl SearchParams {
    pub fn max_results(&self) -> u32 {
        self.max_results.unwrap_or(DEFAULT_SEARCH_RESULTS)
    }

    pub fn start_index(&self) -> u32 {
        self.start_index.unwrap_or(0)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationParams {
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max_results: Option<u32>,
}

impl RecommendationParams {
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn max_results(&self) -> u32 {
        self.max_results.unwrap_or(DEFAULT_RECOMMENDATION_RESULTS)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularParams {
    #[serde(default, deserialize_with = "lenient_number")]
    pub max_results: Option<u32>,
}

impl PopularParams {
    pub fn max_results(&self) -> u32 {
        self.max_results.unwrap_or(DEFAULT_SEARCH_RESULTS)
    }
}

const DEFAULT_SEARCH_RESULTS: u32 = 20;
const DEFAULT_RECOMMENDATION_RESULTS: u32 = 10;
const DEFAULT_CATEGORY: &str = "fiction";

fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| raw.trim().parse().ok()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub books: Vec<Book>,
    pub total_items: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularResponse {
    pub books: Vec<Book>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<PopularBooks> for PopularResponse {
    fn from(popular: PopularBooks) -> Self {
        PopularResponse {
            books: popular.books,
            error: popular.error,
            details: popular.details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
