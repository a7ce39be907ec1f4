//! News Gateway - a cached, authenticated front for news and map providers
//!
//! Serves headlines, article content, place search, routing and map tiles,
//! caching provider responses in memory with per-kind TTLs.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod upstream;

pub use api::{create_router, AppState};
pub use config::Config;
