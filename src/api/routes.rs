//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    article_handler, health_handler, news_handler, preflight_handler, route_handler,
    search_handler, stats_handler, tiles_handler, AppState,
};
use crate::auth::require_auth;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /news` - Cached headlines by category (auth)
/// - `GET /article` - Readable article content (auth)
/// - `GET /travel/search` - Cached place search (auth)
/// - `GET /travel/route` - Route pass-through (auth)
/// - `GET /stats` - Cache statistics (auth)
/// - `GET /tiles` - Cached map tiles (public)
/// - `GET /health` - Health check endpoint (public)
///
/// Every route also answers `OPTIONS` with an empty 200.
///
/// # Middleware
/// - Auth: bearer token check on the protected group only
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/news", get(news_handler).options(preflight_handler))
        .route("/article", get(article_handler).options(preflight_handler))
        .route("/travel/search", get(search_handler).options(preflight_handler))
        .route("/travel/route", get(route_handler).options(preflight_handler))
        .route("/stats", get(stats_handler).options(preflight_handler))
        .route_layer(middleware::from_fn_with_state(
            state.verifier.clone(),
            require_auth,
        ));

    let public = Router::new()
        .route("/tiles", get(tiles_handler).options(preflight_handler))
        .route("/health", get(health_handler).options(preflight_handler));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
