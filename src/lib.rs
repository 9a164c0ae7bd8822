//! # ISBN Atlas
//!
//! A tile server that renders the ISBN identifier space as a zoomable map.
//!
//! Every ISBN-13 starting with `978` is a point in a space of 10^9
//! identifiers, folded into a plane 65536 columns wide. Tiles of that plane
//! are rendered on demand, persisted to disk, and served over HTTP.
//!
//! ## Features
//!
//! - **Density tiles**: how many books of a dataset fall in each pixel
//! - **Registration-group tiles**: one colour per ISBN group prefix
//! - **Publisher tiles**: one colour per publisher range
//! - **Disk cache**: each tile is generated at most once and written atomically
//!
//! ## Architecture
//!
//! - [`space`] - Identifier-space geometry and tile addressing
//! - [`dataset`] - Sorted point sets and their registry
//! - [`render`] - Density and category pixel generators
//! - [`tile`] - Encoding, disk cache, and the tile service
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use isbn_atlas::{
//!     create_router, ClassificationTables, DatasetRegistry, RouterConfig, TileCache,
//!     TileService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let datasets = DatasetRegistry::load_dir("./datasets").await?;
//!     let tables =
//!         ClassificationTables::load("./data/countries.json", "./data/publishers.json").await?;
//!     let service = TileService::new(datasets, tables, TileCache::new("./static/tiles"));
//!
//!     let router = create_router(service, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod render;
pub mod server;
pub mod space;
pub mod tile;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, DataSources, ServeConfig};
pub use dataset::{Dataset, DatasetRegistry, UNION_DATASET};
pub use error::{DatasetError, TableError, TileError};
pub use render::{
    category_color, render_categories, render_density, ClassificationTables, Classifier,
    CountryTable, DensityGrid, PublisherTable, RangeRule,
};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
pub use space::{TileAddress, TileRegion};
pub use tile::{
    TileCache, TileCacheKey, TileEncoder, TileFormat, TileKind, TileRequest, TileResponse,
    TileService,
};
