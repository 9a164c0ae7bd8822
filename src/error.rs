use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading datasets into the registry
#[derive(Debug, Clone, Error)]
pub enum DatasetError {
    /// The dataset file or directory could not be read
    #[error("I/O error reading {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// File length is not a whole number of 4-byte points
    #[error("Invalid dataset length for {path}: {len} bytes is not a multiple of 4")]
    InvalidLength { path: PathBuf, len: usize },

    /// Points must be strictly increasing (sorted and duplicate-free)
    #[error("Dataset '{name}' is not strictly increasing at index {index}")]
    Unsorted { name: String, index: usize },

    /// File name cannot be used as a dataset name
    #[error("Invalid dataset name: {0}")]
    InvalidName(String),
}

/// Errors that can occur when loading classification tables
#[derive(Debug, Clone, Error)]
pub enum TableError {
    /// The table file could not be read
    #[error("I/O error reading {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// The table file is not valid JSON for the expected shape
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Prefix is empty or contains something other than digits and hyphens
    #[error("Invalid prefix: '{0}'")]
    InvalidPrefix(String),

    /// Sub-rule range is inverted
    #[error("Invalid range for prefix '{prefix}': {start} > {end}")]
    InvalidRange { prefix: String, start: u64, end: u64 },
}

/// Errors that can occur while producing a tile
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// No dataset with this name was loaded
    #[error("Dataset not found: {name}")]
    DatasetNotFound { name: String },

    /// Zoom outside the servable range
    #[error("Invalid zoom: {z} (must be {min}-{max})")]
    InvalidZoom { z: u32, min: u32, max: u32 },

    /// A tile coordinate could not be parsed
    #[error("Invalid tile coordinate: '{value}'")]
    InvalidCoordinate { value: String },

    /// Tile coordinates lie outside the identifier space at this zoom
    #[error("Tile ({y}, {x}) at zoom {z} is out of bounds (max: {max_y}, {max_x})")]
    TileOutOfBounds {
        z: u32,
        y: u32,
        x: u32,
        max_y: u32,
        max_x: u32,
    },

    /// The digits after a matched prefix could not be read as a number
    #[error("Malformed identifier '{digits}' after prefix '{prefix}'")]
    MalformedIdentifier { digits: String, prefix: String },

    /// Image encoding failed
    #[error("Encode error: {message}")]
    EncodeError { message: String },

    /// Reading or writing the tile cache failed
    #[error("Cache I/O error at {path}: {message}")]
    CacheIo { path: PathBuf, message: String },

    /// The background generation task did not complete
    #[error("Tile generation failed: {message}")]
    Generation { message: String },
}

impl TileError {
    /// Build a cache I/O error from a path and an `std::io::Error`.
    pub fn cache_io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        TileError::CacheIo {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
