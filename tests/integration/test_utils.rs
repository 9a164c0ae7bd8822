//! Test utilities for integration tests.
//!
//! Builds dataset directories, small classification tables, and tile
//! services rooted in throwaway cache directories.

use std::path::Path;

use image::RgbImage;
use tempfile::TempDir;

use isbn_atlas::dataset::{Dataset, DatasetRegistry};
use isbn_atlas::render::{ClassificationTables, CountryTable, PublisherTable, RangeRule};
use isbn_atlas::tile::{TileCache, TileEncoder, TileService};

/// Points of the `sample` dataset: three of the four cells of tile (1, 0, 0).
pub const SAMPLE_POINTS: [u32; 3] = [0, 1, 65536];

/// Points of the `other` dataset.
pub const OTHER_POINTS: [u32; 2] = [1, 500_000_000];

/// Write `<name>.bin` files into `dir`.
pub fn write_datasets(dir: &Path, datasets: &[(&str, &[u32])]) {
    for (name, points) in datasets {
        let dataset = Dataset::from_points(*name, points.iter().copied());
        std::fs::write(dir.join(format!("{}.bin", name)), dataset.to_bytes()).unwrap();
    }
}

/// Load the `sample` and `other` datasets through the directory loader.
pub async fn load_test_datasets() -> DatasetRegistry {
    let dir = TempDir::new().unwrap();
    write_datasets(
        dir.path(),
        &[("sample", &SAMPLE_POINTS), ("other", &OTHER_POINTS)],
    );
    DatasetRegistry::load_dir(dir.path()).await.unwrap()
}

/// Tables covering the start of the identifier space.
pub fn test_tables() -> ClassificationTables {
    let rule = |start, end, digit_length| RangeRule {
        start,
        end,
        digit_length,
    };
    ClassificationTables {
        countries: CountryTable::new([("978-0", "English language"), ("978-1", "English language")])
            .unwrap(),
        publishers: PublisherTable::new([
            ("978-0", vec![rule(0, 1_999_999, 2), rule(2_000_000, 6_999_999, 3)]),
            ("978-1", vec![rule(0, 9_999_999, 0)]),
        ])
        .unwrap(),
    }
}

/// A tile service whose cache lives in `cache_dir`.
pub async fn create_service(cache_dir: &Path) -> TileService {
    create_service_with(cache_dir, TileEncoder::new(), true).await
}

/// A tile service with a specific encoder and cache mode.
pub async fn create_service_with(
    cache_dir: &Path,
    encoder: TileEncoder,
    cache_enabled: bool,
) -> TileService {
    let cache = TileCache::with_encoder(cache_dir, encoder).with_enabled(cache_enabled);
    TileService::new(load_test_datasets().await, test_tables(), cache)
}

/// Decode an encoded tile.
pub fn decode_tile(data: &[u8]) -> RgbImage {
    image::load_from_memory(data).unwrap().to_rgb8()
}

/// Green channel of every pixel in row-major order.
pub fn greens(image: &RgbImage) -> Vec<u8> {
    image.pixels().map(|p| p[1]).collect()
}
