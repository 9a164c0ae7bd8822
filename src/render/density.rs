//! Density tiles.
//!
//! Points of a dataset that fall inside a tile are counted per output pixel.
//! When a tile covers more than [`MAX_OUTPUT_SIZE`] units per side, each
//! pixel counts a `block_size × block_size` block of the plane; the count is
//! normalised by the block area, gamma corrected, and written to the green
//! channel.
//!
//! Counting each point straight into its block is the same as building the
//! full-resolution occupancy grid and summing blocks, without allocating
//! `section_size²` cells at high zoom.
//!
//! [`MAX_OUTPUT_SIZE`]: crate::space::MAX_OUTPUT_SIZE

use image::{Rgb, RgbImage};

use crate::dataset::Dataset;
use crate::space::{TileAddress, TileRegion};

/// Gamma exponent; values below 1 lift sparse blocks.
pub const GAMMA: f64 = 0.5;

/// Per-pixel point counts for one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityGrid {
    size: usize,
    block_size: u64,
    counts: Vec<u32>,
}

impl DensityGrid {
    /// Count the points of `points` that fall in `region`.
    ///
    /// Points outside the region are skipped, so callers may pass any
    /// superset; [`Dataset::points_in`] narrows a dataset to the region's rows.
    pub fn aggregate(points: &[u32], region: &TileRegion) -> Self {
        let size = region.output_size as usize;
        let mut counts = vec![0u32; size * size];

        for &point in points {
            if let Some((i, j)) = region.cell_of(u64::from(point)) {
                counts[i * size + j] += 1;
            }
        }

        Self {
            size,
            block_size: region.block_size,
            counts,
        }
    }

    /// Side length in pixels.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Points aggregated into each pixel along one axis.
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Count at pixel `(i, j)` (row, column).
    pub fn count(&self, i: usize, j: usize) -> u32 {
        self.counts[i * self.size + j]
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Render to an RGB image with the intensity in the green channel.
    pub fn to_image(&self) -> RgbImage {
        let side = self.size as u32;
        RgbImage::from_fn(side, side, |col, row| {
            let count = self.count(row as usize, col as usize);
            Rgb([0, green_level(count, self.block_size), 0])
        })
    }
}

/// Gamma-corrected intensity in `[0, 1]` for `count` points in a block.
pub fn intensity(count: u32, block_size: u64) -> f64 {
    let area = (block_size * block_size) as f64;
    (f64::from(count) / area).powf(GAMMA)
}

/// 8-bit channel value for `count` points in a block.
pub fn green_level(count: u32, block_size: u64) -> u8 {
    (intensity(count, block_size) * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Render the density tile of `dataset` at `address`.
pub fn render_density(dataset: &Dataset, address: TileAddress) -> RgbImage {
    let region = address.region();
    DensityGrid::aggregate(dataset.points_in(region.row_span()), &region).to_image()
}
