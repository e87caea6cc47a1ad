pub mod api;
pub mod client;
pub mod config;
pub mod data_models;
pub mod error;
pub mod fallback;
pub mod normalizer;
pub mod upstream;
