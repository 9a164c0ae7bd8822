//! Tile service layer.
//!
//! This module turns tile requests into encoded image bytes, backed by a
//! persistent on-disk cache.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  TileCache   │  │   TileEncoder   │  │
//! │  │  (files on   │  │  (RGB → WebP /  │  │
//! │  │   disk)      │  │   JPEG)         │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │     render (density / categories)       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileService`]: Validates requests and dispatches to the renderers
//! - [`TileCache`]: Serves existing tile files, generates and writes missing ones
//! - [`TileCacheKey`]: Tile kind plus address; determines the file path
//! - [`TileEncoder`]: Encodes rendered pixels as lossless WebP or JPEG
//!
//! # Example
//!
//! ```no_run
//! use isbn_atlas::dataset::{Dataset, DatasetRegistry};
//! use isbn_atlas::render::ClassificationTables;
//! use isbn_atlas::tile::{TileCache, TileRequest, TileService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let datasets = DatasetRegistry::new().with_dataset(Dataset::from_points("ia", [0, 1, 65536]));
//!     let service = TileService::new(
//!         datasets,
//!         ClassificationTables::default(),
//!         TileCache::new("./static/tiles"),
//!     );
//!
//!     let tile = service.get_tile(TileRequest::density("ia", 1, 0, 0)).await.unwrap();
//!     println!("{} bytes, cache hit: {}", tile.data.len(), tile.cache_hit);
//! }
//! ```

mod cache;
mod encoder;
mod service;

pub use cache::{CachedTile, TileCache, TileCacheKey, TileKind, DEFAULT_CACHE_DIR};
pub use encoder::{
    clamp_quality, is_valid_quality, TileEncoder, TileFormat, DEFAULT_JPEG_QUALITY,
    MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
pub use service::{TileRequest, TileResponse, TileService};
