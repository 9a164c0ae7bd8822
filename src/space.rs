//! Identifier-space geometry.
//!
//! Every book is a point in a one-dimensional identifier space that is folded
//! into a plane: the low 16 bits select the column and the remaining high bits
//! select the row. A tile address `(z, y, x)` names a square of side `2^z`
//! in that plane.
//!
//! ```text
//!   column = point mod 65536          row = point div 65536
//!
//!   ┌──────── 65536 columns ────────┐
//!   │ (0,0) │ (0,1) │  ...          │  ← tiles of side 2^z
//!   ├───────┼───────┼───────────────┤
//!   │ (1,0) │ (1,1) │  ...          │
//!   └───────┴───────┴───────────────┘
//! ```
//!
//! Tiles never render more than [`MAX_OUTPUT_SIZE`] pixels per side; above
//! that, each output pixel stands for a `block_size × block_size` block.

use std::ops::Range;

/// Offset that turns an identifier-space point into a 12-digit ISBN body.
pub const ISBN_BASE: u64 = 978_000_000_000;

/// Number of columns in one row of the identifier plane.
pub const ROW_WIDTH: u64 = 1 << 16;

/// Number of distinct points under the `978` prefix.
pub const IDENTIFIER_SPACE: u64 = 1_000_000_000;

/// Number of rows needed to hold the whole identifier space.
pub const ROW_COUNT: u64 = IDENTIFIER_SPACE.div_ceil(ROW_WIDTH);

/// Maximum side length of a rendered tile in pixels.
pub const MAX_OUTPUT_SIZE: u64 = 256;

/// Smallest zoom served for rendered tiles (zoom 0 belongs to cover images).
pub const MIN_ZOOM: u32 = 1;

/// Largest zoom served for rendered tiles; one tile then spans a full row.
pub const MAX_ZOOM: u32 = 16;

/// Split a point into `(row, column)`.
#[inline]
pub fn split_point(point: u64) -> (u64, u64) {
    (point / ROW_WIDTH, point % ROW_WIDTH)
}

/// The 12-digit ISBN body (without check digit) for a point.
#[inline]
pub fn isbn12(point: u64) -> u64 {
    ISBN_BASE + point
}

/// Number of tiles `(rows, columns)` covering the identifier space at zoom `z`.
pub fn tile_grid(z: u32) -> (u32, u32) {
    let section_size = 1u64 << z;
    let rows = ROW_COUNT.div_ceil(section_size);
    let cols = (ROW_WIDTH / section_size).max(1);
    (rows as u32, cols as u32)
}

// =============================================================================
// Tile Address
// =============================================================================

/// A tile address `(z, y, x)`.
///
/// Zoom is not range checked here; callers bound it before resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileAddress {
    /// Zoom exponent; a tile spans `2^z` rows and columns
    pub z: u32,

    /// Tile row at this zoom
    pub y: u32,

    /// Tile column at this zoom
    pub x: u32,
}

impl TileAddress {
    /// Create a new tile address.
    pub fn new(z: u32, y: u32, x: u32) -> Self {
        Self { z, y, x }
    }

    /// The tile at zoom `z` whose region contains `point`.
    pub fn containing(z: u32, point: u64) -> Self {
        let section_size = 1u64 << z;
        let (row, col) = split_point(point);
        Self {
            z,
            y: (row / section_size) as u32,
            x: (col / section_size) as u32,
        }
    }

    /// Side length of the covered square, in identifier-space units.
    #[inline]
    pub fn section_size(&self) -> u64 {
        1u64 << self.z
    }

    /// Side length of the rendered grid.
    #[inline]
    pub fn output_size(&self) -> u64 {
        self.section_size().min(MAX_OUTPUT_SIZE)
    }

    /// Resolve the region used by the density aggregator.
    pub fn region(&self) -> TileRegion {
        let section_size = self.section_size();
        let output_size = self.output_size();
        TileRegion {
            section_size,
            output_size,
            block_size: section_size / output_size,
            row_start: u64::from(self.y) * section_size,
            col_start: u64::from(self.x) * section_size,
        }
    }

    /// Resolve the sampling lattice used by the prefix classifier.
    pub fn category_region(&self) -> CategoryRegion {
        let section_size = self.section_size();
        let output_size = self.output_size();
        let cell_increment = if section_size <= MAX_OUTPUT_SIZE {
            1
        } else {
            section_size / output_size
        };
        CategoryRegion {
            output_size,
            cell_increment,
            start_value: ISBN_BASE
                + section_size * u64::from(self.x)
                + ROW_WIDTH * section_size * u64::from(self.y),
        }
    }
}

// =============================================================================
// Tile Region
// =============================================================================

/// The rectangle of identifier space covered by one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRegion {
    /// Side of the covered square in identifier-space units
    pub section_size: u64,

    /// Side of the rendered grid in pixels
    pub output_size: u64,

    /// Identifier-space units per output pixel along each axis
    pub block_size: u64,

    /// First covered row
    pub row_start: u64,

    /// First covered column
    pub col_start: u64,
}

impl TileRegion {
    /// Whether `(row, col)` lies inside this region.
    #[inline]
    pub fn contains(&self, row: u64, col: u64) -> bool {
        (self.row_start..self.row_start + self.section_size).contains(&row)
            && (self.col_start..self.col_start + self.section_size).contains(&col)
    }

    /// Whether `point` lies inside this region.
    #[inline]
    pub fn contains_point(&self, point: u64) -> bool {
        let (row, col) = split_point(point);
        self.contains(row, col)
    }

    /// The contiguous span of points whose rows fall inside the region.
    ///
    /// Every point of the region lies in this span, but points of the span
    /// may still fall outside the region's columns.
    pub fn row_span(&self) -> Range<u64> {
        self.row_start * ROW_WIDTH..(self.row_start + self.section_size) * ROW_WIDTH
    }

    /// Output pixel `(row, col)` that `point` accumulates into.
    pub fn cell_of(&self, point: u64) -> Option<(usize, usize)> {
        let (row, col) = split_point(point);
        if !self.contains(row, col) {
            return None;
        }
        let i = (row - self.row_start) / self.block_size;
        let j = (col - self.col_start) / self.block_size;
        Some((i as usize, j as usize))
    }
}

/// Sampling lattice for category tiles.
///
/// Pixel `(i, j)` samples a single identifier rather than aggregating a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRegion {
    /// Side of the rendered grid in pixels
    pub output_size: u64,

    /// Identifier-space step between adjacent pixels
    pub cell_increment: u64,

    /// 12-digit ISBN body sampled by pixel `(0, 0)`
    pub start_value: u64,
}

impl CategoryRegion {
    /// 12-digit ISBN body sampled by pixel `(i, j)`.
    #[inline]
    pub fn value_at(&self, i: u64, j: u64) -> u64 {
        self.start_value + self.cell_increment * (j + i * ROW_WIDTH)
    }
}

// =============================================================================
// Tests
// =============================================================================
