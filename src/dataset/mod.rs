//! Book datasets.
//!
//! A dataset is an immutable, sorted, duplicate-free list of identifier-space
//! points, one list per source catalogue. Datasets are loaded once before the
//! server starts and are shared read-only through the [`DatasetRegistry`].
//!
//! # File Format
//!
//! Each dataset is stored as `<name>.bin`: packed little-endian `u32` points
//! in strictly increasing order. A point is the ISBN-13 with the `978` prefix
//! and the check digit removed.
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬─────┐
//! │ u32 (LE) │ u32 (LE) │ u32 (LE) │ ... │
//! └──────────┴──────────┴──────────┴─────┘
//! ```

mod registry;

use std::ops::Range;
use std::path::Path;

use bytes::Buf;

use crate::error::DatasetError;

pub use registry::{DatasetRegistry, DATASET_EXTENSION, UNION_DATASET};

/// A named, sorted set of identifier-space points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    name: String,
    points: Vec<u32>,
}

impl Dataset {
    /// Create a dataset from points that are already strictly increasing.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Unsorted`] at the first point that is not
    /// greater than its predecessor.
    pub fn new(name: impl Into<String>, points: Vec<u32>) -> Result<Self, DatasetError> {
        let name = name.into();
        if let Some(index) = points.windows(2).position(|w| w[0] >= w[1]) {
            return Err(DatasetError::Unsorted {
                name,
                index: index + 1,
            });
        }
        Ok(Self { name, points })
    }

    /// Create a dataset from arbitrary points, sorting and de-duplicating them.
    pub fn from_points(name: impl Into<String>, points: impl IntoIterator<Item = u32>) -> Self {
        let mut points: Vec<u32> = points.into_iter().collect();
        points.sort_unstable();
        points.dedup();
        Self {
            name: name.into(),
            points,
        }
    }

    /// Decode a dataset from its on-disk byte representation.
    pub fn from_bytes(
        name: impl Into<String>,
        path: &Path,
        mut data: &[u8],
    ) -> Result<Self, DatasetError> {
        if data.len() % 4 != 0 {
            return Err(DatasetError::InvalidLength {
                path: path.to_path_buf(),
                len: data.len(),
            });
        }

        let mut points = Vec::with_capacity(data.len() / 4);
        while data.has_remaining() {
            points.push(data.get_u32_le());
        }

        Self::new(name, points)
    }

    /// Encode the dataset to its on-disk byte representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.points.iter().flat_map(|p| p.to_le_bytes()).collect()
    }

    /// Sorted union of several datasets.
    pub fn union<'a>(name: impl Into<String>, datasets: impl IntoIterator<Item = &'a Dataset>) -> Self {
        Self::from_points(
            name,
            datasets
                .into_iter()
                .flat_map(|d| d.points.iter().copied()),
        )
    }

    /// Dataset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All points in increasing order.
    pub fn points(&self) -> &[u32] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the dataset has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The contiguous slice of points falling in `span`.
    pub fn points_in(&self, span: Range<u64>) -> &[u32] {
        let lo = self.points.partition_point(|&p| u64::from(p) < span.start);
        let hi = self.points.partition_point(|&p| u64::from(p) < span.end);
        &self.points[lo..hi.max(lo)]
    }
}
