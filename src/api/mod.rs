//! API Module
//!
//! HTTP handlers and routing for the gateway.
//!
//! # Endpoints
//! - `GET /news` - Headlines by category
//! - `GET /article` - Readable content of an article page
//! - `GET /travel/search` - Place search
//! - `GET /travel/route` - Route calculation pass-through
//! - `GET /tiles` - Map raster tiles
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
