use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::data_models::Book;
use crate::error::ApiError;
use crate::normalizer::{FieldSet, normalize, normalize_list};
use crate::upstream::VolumeQuery;

use super::AppState;
use super::models::{
    HealthResponse, PopularParams, PopularResponse, RecommendationParams,
    RecommendationsResponse, SearchParams, SearchResponse,
};

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();

    let q = match params.q.as_deref() {
        Some(q) if !q.trim().is_empty() => q.to_string(),
        _ => return Err(ApiError::BadRequest("Search query is required".to_string())),
    };

    let query = VolumeQuery::new(q, params.max_results()).start_index(params.start_index());
    let list = state.books.list_volumes(&query).await.map_err(|e| {
        error!(q = %query.q, status = ?e.status(), "error searching books: {e}");
        ApiError::upstream("Failed to search books", e)
    })?;

    let books = normalize_list(&list, FieldSet::Listing);
    info!(
        q = %query.q,
        results = books.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "search served"
    );

    Ok(Json(SearchResponse {
        books,
        total_items: list.total_items.unwrap_or(0),
    }))
}

pub async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let item = state.books.get_volume(&id).await.map_err(|e| {
        error!(%id, status = ?e.status(), "error fetching book: {e}");
        ApiError::upstream("Failed to fetch book details", e)
    })?;

    Ok(Json(normalize(&item, FieldSet::Detail)))
}

pub async fn recommendations_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let category = params.category();
    let q = state.recommendation_style.query_for(category);
    let query = VolumeQuery::new(q, params.max_results()).order_by("relevance");

    let list = state.books.list_volumes(&query).await.map_err(|e| {
        error!(%category, status = ?e.status(), "error fetching recommendations: {e}");
        ApiError::upstream("Failed to fetch recommendations", e)
    })?;

    Ok(Json(RecommendationsResponse {
        books: normalize_list(&list, FieldSet::Listing),
    }))
}

/// Always 200: failures are reported in-band by the sequencer.
pub async fn popular_handler(
    State(state): State<Arc<AppState>>,
    params: Option<Query<PopularParams>>,
) -> Json<PopularResponse> {
    let max_results = params
        .map(|Query(p)| p)
        .unwrap_or_default()
        .max_results();
    Json(state.popular.fetch(max_results).await.into())
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Read This Next API is running".to_string(),
    })
}
