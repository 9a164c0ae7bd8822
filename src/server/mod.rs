//! HTTP server layer.
//!
//! This module exposes rendered tiles over HTTP and is the boundary that
//! rejects invalid zooms, coordinates, and dataset names before they reach
//! the renderers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │         GET /tiles/{kind}/.../{z}/{y}/{x}.webp                  │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │  (requests, error map)   │  │  (router, CORS, tracing)    │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    countries_tile_handler, datasets_handler, density_tile_handler, health_handler,
    publishers_tile_handler, AppState, CategoryPathParams, DatasetSummary, DatasetsResponse,
    DensityPathParams, ErrorResponse, HealthResponse,
};
pub use routes::{create_router, CorsPolicy, RouterConfig, DEFAULT_CACHE_MAX_AGE};
