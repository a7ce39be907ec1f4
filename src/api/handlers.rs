//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint. Cached routes resolve
//! through their [`CacheAside`]; `/article` and `/travel/route` go straight
//! to the provider.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use jsonwebtoken::jwk::JwkSet;
use tracing::warn;

use crate::auth::{FirebaseVerifier, JwksClient, ServiceAccount, TokenVerifier};
use crate::cache::{
    CacheAside, TileStore, TtlStore, WithTtl, NEWS_TTL, SEARCH_TTL, SIGNING_KEYS_TTL,
};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    Article, ArticleContent, ArticleQuery, HealthResponse, NewsQuery, RouteQuery, SearchQuery,
    SearchResults, StatsResponse, TileQuery,
};
use crate::upstream::{
    build_http_client, ArticleExtractor, Fetch, NewsClient, RouteProxy, SearchClient, TileClient,
    UpstreamError,
};

/// Browsers may keep a tile for a week without revalidating.
pub const TILE_CACHE_CONTROL: &str = "public, max-age=604800, immutable";

/// Application state shared across all handlers.
///
/// Every store lives as long as the server and is shared through `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub news: Arc<CacheAside<Vec<Article>>>,
    pub search: Arc<CacheAside<SearchResults>>,
    pub tiles: Arc<CacheAside<Bytes>>,
    pub signing_keys: Arc<CacheAside<JwkSet>>,
    /// Uncached article extraction
    pub articles: Arc<dyn Fetch<Output = ArticleContent>>,
    /// Uncached route pass-through
    pub routes: Arc<RouteProxy>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// Creates a new AppState from configuration.
    ///
    /// One outbound client is shared by every provider.
    pub fn from_config(
        config: &Config,
        account: &ServiceAccount,
    ) -> std::result::Result<Self, UpstreamError> {
        let http = build_http_client(config.upstream_timeout)
            .map_err(|err| UpstreamError::InvalidRequest(format!("http client: {err}")))?;

        let news_client = NewsClient::new(http.clone(), &config.gnews_base_url, &config.gnews_api_key)?;
        let search_client =
            SearchClient::new(http.clone(), &config.tomtom_search_url, &config.tomtom_api_key)?;
        let tile_client =
            TileClient::new(http.clone(), &config.tomtom_tile_url, &config.tomtom_api_key)?;
        let routes = RouteProxy::new(http.clone(), &config.tomtom_route_url, &config.tomtom_api_key)?;

        let news = CacheAside::<Vec<Article>>::new(
            "NEWS",
            Arc::new(WithTtl::new(Arc::new(TtlStore::<Vec<Article>>::new()), NEWS_TTL)),
            Arc::new(news_client),
        );
        let search = CacheAside::<SearchResults>::new(
            "SEARCH",
            Arc::new(WithTtl::new(Arc::new(TtlStore::<SearchResults>::new()), SEARCH_TTL)),
            Arc::new(search_client),
        );
        let tiles = CacheAside::<Bytes>::new(
            "TILES",
            Arc::new(TileStore::default()),
            Arc::new(tile_client),
        );
        let signing_keys = Arc::new(CacheAside::<JwkSet>::new(
            "SIGNING KEYS",
            Arc::new(WithTtl::new(Arc::new(TtlStore::<JwkSet>::new()), SIGNING_KEYS_TTL)),
            Arc::new(JwksClient::new(http.clone())),
        ));
        let verifier = FirebaseVerifier::new(account, &config.jwks_url, signing_keys.clone());

        Ok(Self {
            news: Arc::new(news),
            search: Arc::new(search),
            tiles: Arc::new(tiles),
            signing_keys,
            articles: Arc::new(ArticleExtractor::new(http)),
            routes: Arc::new(routes),
            verifier: Arc::new(verifier),
        })
    }
}

/// Handler for GET /news
///
/// Returns the article list for `category`, defaulting to general news.
pub async fn news_handler(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<Vec<Article>>> {
    let category = query.category();
    let articles = state.news.resolve(category.as_str()).await?;
    Ok(Json(articles))
}

/// Handler for GET /article
///
/// Fetches the page live and returns its readable content.
pub async fn article_handler(
    State(state): State<AppState>,
    Query(query): Query<ArticleQuery>,
) -> Result<Json<ArticleContent>> {
    let target = query.target().map_err(AppError::Validation)?;
    let content = state.articles.fetch(target.as_str()).await?;
    Ok(Json(content))
}

/// Handler for GET /travel/search
pub async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>> {
    let key = query.cache_key().map_err(AppError::Validation)?;
    let results = state.search.resolve(&key).await?;
    Ok(Json(results))
}

/// Handler for GET /tiles
///
/// Public. A provider rejection is relayed with the provider's own status.
pub async fn tiles_handler(
    State(state): State<AppState>,
    Query(query): Query<TileQuery>,
) -> Result<Response> {
    let key = query.cache_key().map_err(AppError::Validation)?;
    let png = state
        .tiles
        .resolve(&key)
        .await
        .map_err(|err| AppError::forward_rejection(err, "TomTom"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, TILE_CACHE_CONTROL),
        ],
        png,
    )
        .into_response())
}

/// Handler for GET /travel/route
///
/// Streams the provider's answer back with its status, uncached.
pub async fn route_handler(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Response> {
    let points = query.points().map_err(AppError::Validation)?;
    let upstream = state.routes.open(points).await?;

    let status = upstream.status();
    if !status.is_success() {
        warn!("[ROUTE API] upstream answered {} for {}", status.as_u16(), points);
    }

    let body = Body::from_stream(upstream.bytes_stream());
    Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Handler for GET /stats
///
/// Returns per-store cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        news: state.news.stats().await,
        search: state.search.stats().await,
        tiles: state.tiles.stats().await,
        signing_keys: state.signing_keys.stats().await,
    })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for OPTIONS on every route
pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}
