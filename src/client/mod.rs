//! Consumer side of the `/api` surface: a typed HTTP wrapper and the
//! search pagination controller built on it.

pub mod pagination;
pub mod service;

pub use pagination::{PageOutcome, SearchPager, SearchResultPage, SearchSource, SkipReason};
pub use service::BookService;
