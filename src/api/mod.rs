use axum::{
    Router,
    http::{HeaderValue, header},
    middleware,
    routing::get,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::{Config, RecommendationQueryStyle};
use crate::fallback::PopularSequencer;
use crate::upstream::BooksApi;

pub mod handlers;
pub mod models;
pub mod rate_limit;

use rate_limit::RateLimiter;

/// Shared by every handler. Holds no per-request state.
pub struct AppState {
    pub books: Arc<dyn BooksApi>,
    pub popular: PopularSequencer,
    pub recommendation_style: RecommendationQueryStyle,
}

impl AppState {
    pub fn new(books: Arc<dyn BooksApi>, config: &Config) -> Self {
        Self {
            popular: PopularSequencer::new(books.clone(), config.popular_latency_budget),
            books,
            recommendation_style: config.recommendation_query_style,
        }
    }
}

pub fn create_router(
    state: Arc<AppState>,
    limiter: Arc<RateLimiter>,
    static_dir: Option<&str>,
) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Literal segments go before `:id` so they are never read as a book id.
    let api = Router::new()
        .route("/books/search", get(handlers::search_handler))
        .route("/books/recommendations", get(handlers::recommendations_handler))
        .route("/books/popular", get(handlers::popular_handler))
        .route("/books/:id", get(handlers::get_book_handler))
        .route("/health", get(handlers::health_handler))
        .with_state(state)
        .layer(middleware::from_fn_with_state(limiter, rate_limit::rate_limit));

    let mut router = Router::new().nest("/api", api);

    // Static file serving for the production UI bundle
    if let Some(dir) = static_dir {
        let index = Path::new(dir).join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
}
