//! Router configuration.
//!
//! # Route Structure
//!
//! ```text
//! /health                                          - Health check
//! /datasets                                        - Loaded datasets
//! /tiles/density/{dataset}/{z}/{y}/{x}.webp        - Density tile
//! /tiles/countries/{z}/{y}/{x}.webp                - Registration-group tile
//! /tiles/publishers/{z}/{y}/{x}.webp               - Publisher-range tile
//! ```
//!
//! # Example
//!
//! ```ignore
//! use isbn_atlas::server::{create_router, RouterConfig};
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//! let router = create_router(tile_service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{
    countries_tile_handler, datasets_handler, density_tile_handler, health_handler,
    publishers_tile_handler, AppState, CACHE_HIT_HEADER,
};
use crate::tile::TileService;

/// Default Cache-Control max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// How long browsers may cache a CORS preflight response.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86400);

// =============================================================================
// Router Configuration
// =============================================================================

/// Which origins may fetch tiles from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Any origin (`Access-Control-Allow-Origin: *`)
    AnyOrigin,

    /// Only the listed origins; an empty list blocks cross-origin reads
    Origins(Vec<HeaderValue>),
}

impl CorsPolicy {
    /// Build a policy from origin strings, skipping any that are not valid
    /// header values. A `*` entry allows any origin.
    pub fn from_origins<S: AsRef<str>>(origins: &[S]) -> Self {
        if origins.iter().any(|origin| origin.as_ref() == "*") {
            return CorsPolicy::AnyOrigin;
        }

        let parsed = origins
            .iter()
            .filter_map(|origin| {
                let origin = origin.as_ref();
                let value = HeaderValue::from_str(origin).ok();
                if value.is_none() {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                }
                value
            })
            .collect();
        CorsPolicy::Origins(parsed)
    }

    fn layer(&self) -> CorsLayer {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE])
            .expose_headers([CACHE_HIT_HEADER])
            .max_age(PREFLIGHT_MAX_AGE);

        match self {
            CorsPolicy::AnyOrigin => cors.allow_origin(AllowOrigin::any()),
            CorsPolicy::Origins(origins) if origins.is_empty() => cors,
            CorsPolicy::Origins(origins) => cors.allow_origin(AllowOrigin::list(origins.clone())),
        }
    }
}

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Cross-origin access to tiles and metadata
    pub cors: CorsPolicy,

    /// Cache-Control max-age in seconds for tile responses
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Allow any origin, let clients cache tiles for an hour, and trace
    /// requests.
    pub fn new() -> Self {
        Self {
            cors: CorsPolicy::AnyOrigin,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
        }
    }

    /// Restrict cross-origin access to `origins`.
    ///
    /// An empty list blocks all cross-origin reads.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsPolicy::from_origins(&origins);
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
pub fn create_router(tile_service: TileService, config: RouterConfig) -> Router {
    let app_state = AppState::with_cache_max_age(tile_service, config.cache_max_age);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/datasets", get(datasets_handler))
        .nest("/tiles", tile_routes())
        .with_state(app_state)
        .layer(config.cors.layer());

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Tile routes, relative to `/tiles`.
///
/// The last segment is the column with an optional extension, so both
/// `.../{x}` and `.../{x}.webp` resolve.
fn tile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/density/{dataset}/{z}/{y}/{filename}",
            get(density_tile_handler),
        )
        .route("/countries/{z}/{y}/{filename}", get(countries_tile_handler))
        .route(
            "/publishers/{z}/{y}/{filename}",
            get(publishers_tile_handler),
        )
}

// =============================================================================
// Tests
// =============================================================================
