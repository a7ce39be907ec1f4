//! Request and Response models for the gateway API
//!
//! Query-string DTOs for each route, the provider payloads the gateway
//! caches, and the response bodies it writes.

pub mod news;
pub mod places;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use news::{Article, ArticleSource};
pub use places::{Address, Place, Position, SearchResults};
pub use requests::{ArticleQuery, NewsQuery, RouteQuery, SearchQuery, TileQuery};
pub use responses::{ArticleContent, HealthResponse, StatsResponse};
