//! Tile Service for orchestrating tile generation.
//!
//! The TileService is the main entry point for tile requests. It:
//! - Validates zoom, coordinates, and dataset name
//! - Looks the tile up in the disk cache
//! - On a miss, dispatches to the density or category renderer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         TileService                             │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    get_tile()                           │    │
//! │  │  1. Validate request   3. Render (density | category)   │    │
//! │  │  2. Check disk cache   4. Encode, persist & return      │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌───────────┐     ┌─────────────────┐   ┌────────────────┐   │
//! │    │ TileCache │     │ DatasetRegistry │   │ Classification │   │
//! │    │  (disk)   │     │                 │   │ Tables         │   │
//! │    └───────────┘     └─────────────────┘   └────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use bytes::Bytes;

use crate::dataset::DatasetRegistry;
use crate::error::TileError;
use crate::render::{render_categories, render_density, ClassificationTables};
use crate::space::{tile_grid, TileAddress, MAX_ZOOM, MIN_ZOOM};

use super::cache::{TileCache, TileCacheKey, TileKind};
use super::encoder::TileFormat;

// =============================================================================
// Tile Request
// =============================================================================

/// A request for a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    /// What to render
    pub kind: TileKind,

    /// Where to render it
    pub address: TileAddress,
}

impl TileRequest {
    /// Request a density tile of `dataset`.
    pub fn density(dataset: impl Into<Arc<str>>, z: u32, y: u32, x: u32) -> Self {
        Self {
            kind: TileKind::density(dataset),
            address: TileAddress::new(z, y, x),
        }
    }

    /// Request a registration-group tile.
    pub fn countries(z: u32, y: u32, x: u32) -> Self {
        Self {
            kind: TileKind::Countries,
            address: TileAddress::new(z, y, x),
        }
    }

    /// Request a publisher-range tile.
    pub fn publishers(z: u32, y: u32, x: u32) -> Self {
        Self {
            kind: TileKind::Publishers,
            address: TileAddress::new(z, y, x),
        }
    }
}

// =============================================================================
// Tile Response
// =============================================================================

/// Response from the tile service.
#[derive(Debug, Clone)]
pub struct TileResponse {
    /// The encoded tile data
    pub data: Bytes,

    /// Whether this tile was served from the disk cache
    pub cache_hit: bool,

    /// Container format of `data`
    pub format: TileFormat,
}

// =============================================================================
// Tile Service
// =============================================================================

/// Service for generating and caching tiles.
///
/// Datasets and tables are shared read-only; the service itself can be
/// wrapped in an `Arc` and used from any number of tasks.
pub struct TileService {
    datasets: Arc<DatasetRegistry>,
    tables: Arc<ClassificationTables>,
    cache: TileCache,
}

impl TileService {
    /// Create a new tile service.
    pub fn new(datasets: DatasetRegistry, tables: ClassificationTables, cache: TileCache) -> Self {
        Self::with_shared(Arc::new(datasets), Arc::new(tables), cache)
    }

    /// Create a tile service over already shared datasets and tables.
    pub fn with_shared(
        datasets: Arc<DatasetRegistry>,
        tables: Arc<ClassificationTables>,
        cache: TileCache,
    ) -> Self {
        Self {
            datasets,
            tables,
            cache,
        }
    }

    /// Loaded datasets.
    pub fn datasets(&self) -> &Arc<DatasetRegistry> {
        &self.datasets
    }

    /// Loaded classification tables.
    pub fn tables(&self) -> &Arc<ClassificationTables> {
        &self.tables
    }

    /// The tile cache.
    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Check that a request names a servable tile.
    ///
    /// # Errors
    ///
    /// - [`TileError::InvalidZoom`] unless `1 <= z <= 16`
    /// - [`TileError::TileOutOfBounds`] if the tile lies past the identifier space
    /// - [`TileError::DatasetNotFound`] for an unknown density dataset
    pub fn validate(&self, request: &TileRequest) -> Result<(), TileError> {
        let TileAddress { z, y, x } = request.address;

        if !(MIN_ZOOM..=MAX_ZOOM).contains(&z) {
            return Err(TileError::InvalidZoom {
                z,
                min: MIN_ZOOM,
                max: MAX_ZOOM,
            });
        }

        let (rows, cols) = tile_grid(z);
        if y >= rows || x >= cols {
            return Err(TileError::TileOutOfBounds {
                z,
                y,
                x,
                max_y: rows - 1,
                max_x: cols - 1,
            });
        }

        if let TileKind::Density { dataset } = &request.kind {
            if !self.datasets.contains(dataset) {
                return Err(TileError::DatasetNotFound {
                    name: dataset.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get a tile, generating and persisting it on a cache miss.
    pub async fn get_tile(&self, request: TileRequest) -> Result<TileResponse, TileError> {
        self.validate(&request)?;

        let address = request.address;
        let key = TileCacheKey::new(request.kind.clone(), address);

        let tile = match &request.kind {
            TileKind::Density { dataset } => {
                let dataset =
                    self.datasets
                        .get(dataset)
                        .ok_or_else(|| TileError::DatasetNotFound {
                            name: dataset.to_string(),
                        })?;
                self.cache
                    .get_or_create(key, move || Ok(render_density(&dataset, address)))
                    .await?
            }
            TileKind::Countries => {
                let tables = Arc::clone(&self.tables);
                self.cache
                    .get_or_create(key, move || render_categories(&tables.countries, address))
                    .await?
            }
            TileKind::Publishers => {
                let tables = Arc::clone(&self.tables);
                self.cache
                    .get_or_create(key, move || render_categories(&tables.publishers, address))
                    .await?
            }
        };

        Ok(TileResponse {
            data: tile.data,
            cache_hit: tile.cache_hit,
            format: self.cache.encoder().format(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::render::{category_color, CountryTable, PublisherTable, RangeRule};

    fn service(root: &std::path::Path) -> TileService {
        let datasets =
            DatasetRegistry::new().with_dataset(Dataset::from_points("ia", [0, 1, 65536]));
        let tables = ClassificationTables {
            countries: CountryTable::new([("978-0", "English language")]).unwrap(),
            publishers: PublisherTable::new([(
                "978-0",
                vec![RangeRule {
                    start: 0,
                    end: 1_999_999,
                    digit_length: 2,
                }],
            )])
            .unwrap(),
        };
        TileService::new(datasets, tables, TileCache::new(root))
    }

    #[test]
    fn test_validate_zoom() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        assert!(matches!(
            service.validate(&TileRequest::countries(0, 0, 0)),
            Err(TileError::InvalidZoom { z: 0, .. })
        ));
        assert!(matches!(
            service.validate(&TileRequest::countries(17, 0, 0)),
            Err(TileError::InvalidZoom { z: 17, .. })
        ));
        assert!(service.validate(&TileRequest::countries(16, 0, 0)).is_ok());
        assert!(service.validate(&TileRequest::countries(1, 0, 0)).is_ok());
    }

    #[test]
    fn test_validate_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        assert!(service.validate(&TileRequest::countries(16, 0, 1)).is_err());
        assert!(service.validate(&TileRequest::countries(16, 1, 0)).is_err());
        assert!(service.validate(&TileRequest::countries(8, 59, 255)).is_ok());
        assert!(matches!(
            service.validate(&TileRequest::countries(8, 60, 0)),
            Err(TileError::TileOutOfBounds { max_y: 59, max_x: 255, .. })
        ));
    }

    #[test]
    fn test_validate_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        assert!(service.validate(&TileRequest::density("ia", 1, 0, 0)).is_ok());
        assert!(matches!(
            service.validate(&TileRequest::density("missing", 1, 0, 0)),
            Err(TileError::DatasetNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_density_tile() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let response = service
            .get_tile(TileRequest::density("ia", 1, 0, 0))
            .await
            .unwrap();
        assert!(!response.cache_hit);
        assert_eq!(response.format, TileFormat::WebP);

        let image = service.cache().encoder().decode(&response.data).unwrap();
        let greens: Vec<u8> = image.pixels().map(|p| p.0[1]).collect();
        assert_eq!(greens, vec![255, 255, 255, 0]);
    }

    #[tokio::test]
    async fn test_cache_idempotence() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let request = TileRequest::countries(3, 0, 0);

        let first = service.get_tile(request.clone()).await.unwrap();
        let second = service.get_tile(request).await.unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.data, second.data);

        let image = service.cache().encoder().decode(&second.data).unwrap();
        assert!(image.pixels().all(|p| *p == category_color(0)));
    }

    #[tokio::test]
    async fn test_publisher_tile() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let response = service
            .get_tile(TileRequest::publishers(2, 0, 0))
            .await
            .unwrap();
        let image = service.cache().encoder().decode(&response.data).unwrap();
        assert_eq!(image.dimensions(), (4, 4));
        assert!(image.pixels().all(|p| *p == category_color(0)));
    }

    #[tokio::test]
    async fn test_kinds_cached_separately() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        service
            .get_tile(TileRequest::countries(1, 0, 0))
            .await
            .unwrap();
        let publishers = service
            .get_tile(TileRequest::publishers(1, 0, 0))
            .await
            .unwrap();
        assert!(!publishers.cache_hit);

        assert!(dir.path().join("countries/1/0/0.webp").exists());
        assert!(dir.path().join("publishers/1/0/0.webp").exists());
    }

    #[tokio::test]
    async fn test_invalid_request_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        assert!(service
            .get_tile(TileRequest::density("missing", 1, 0, 0))
            .await
            .is_err());
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
