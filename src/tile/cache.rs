//! On-disk cache for encoded tiles.
//!
//! Tiles are stored one file per key under a directory tree keyed by kind,
//! zoom, row and column:
//!
//! ```text
//! {root}/density/{dataset}/{z}/{y}/{x}.webp
//! {root}/countries/{z}/{y}/{x}.webp
//! {root}/publishers/{z}/{y}/{x}.webp
//! ```
//!
//! A file that exists is served as-is, with no validation or staleness
//! check. A missing file is generated, encoded, written, and returned.
//! Entries are never evicted.
//!
//! # Concurrency
//!
//! Concurrent misses for the same key share one generation: the first caller
//! renders while later callers wait on the same cell and receive its result.
//! Files are written to a temporary sibling and renamed into place, so a
//! reader never observes a partially written tile.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use image::RgbImage;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::TileError;
use crate::space::TileAddress;

use super::encoder::TileEncoder;

/// Default root directory for cached tiles.
pub const DEFAULT_CACHE_DIR: &str = "./static/tiles";

// =============================================================================
// Cache Key
// =============================================================================

/// What a tile depicts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Book density of one dataset
    Density { dataset: Arc<str> },

    /// Registration groups
    Countries,

    /// Publisher ranges
    Publishers,
}

impl TileKind {
    /// Density tile of `dataset`.
    pub fn density(dataset: impl Into<Arc<str>>) -> Self {
        TileKind::Density {
            dataset: dataset.into(),
        }
    }

    /// Directory of this kind relative to the cache root.
    fn directory(&self) -> PathBuf {
        match self {
            TileKind::Density { dataset } => Path::new("density").join(dataset.as_ref()),
            TileKind::Countries => PathBuf::from("countries"),
            TileKind::Publishers => PathBuf::from("publishers"),
        }
    }
}

/// Cache key: a tile kind at an address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileCacheKey {
    /// What the tile depicts
    pub kind: TileKind,

    /// Where the tile is
    pub address: TileAddress,
}

impl TileCacheKey {
    /// Create a new cache key.
    pub fn new(kind: TileKind, address: TileAddress) -> Self {
        Self { kind, address }
    }
}

/// Encoded tile returned by the cache.
#[derive(Debug, Clone)]
pub struct CachedTile {
    /// Encoded image bytes
    pub data: Bytes,

    /// Whether the bytes came from disk without generation
    pub cache_hit: bool,
}

// =============================================================================
// Tile Cache
// =============================================================================

type InFlight = Arc<OnceCell<Result<Bytes, TileError>>>;

/// Disk-backed tile cache.
pub struct TileCache {
    /// Root directory of the tile tree
    root: PathBuf,

    /// When false, existing files are ignored and tiles are regenerated
    enabled: bool,

    /// Encoder for freshly generated tiles
    encoder: TileEncoder,

    /// Generations currently running, by key
    in_flight: InFlightMap,
}

impl TileCache {
    /// Create a cache rooted at `root` using lossless WebP.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_encoder(root, TileEncoder::new())
    }

    /// Create a cache rooted at `root` with a specific encoder.
    pub fn with_encoder(root: impl Into<PathBuf>, encoder: TileEncoder) -> Self {
        Self {
            root: root.into(),
            enabled: true,
            encoder,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Enable or disable serving existing files.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Encoder used for new tiles.
    pub fn encoder(&self) -> &TileEncoder {
        &self.encoder
    }

    /// Whether existing files are served.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// File path for `key`.
    pub fn path_for(&self, key: &TileCacheKey) -> PathBuf {
        let TileAddress { z, y, x } = key.address;
        self.root
            .join(key.kind.directory())
            .join(z.to_string())
            .join(y.to_string())
            .join(format!("{}.{}", x, self.encoder.format().extension()))
    }

    /// Read the cached bytes for `key`, if present and caching is enabled.
    pub async fn get(&self, key: &TileCacheKey) -> Result<Option<Bytes>, TileError> {
        if !self.enabled {
            return Ok(None);
        }
        read_if_present(&self.path_for(key)).await
    }

    /// Serve `key` from disk, or generate, encode, and persist it.
    ///
    /// `generate` runs on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Errors from `generate`, from encoding, and from creating directories
    /// or writing the file are returned to the caller. Nothing is retried.
    pub async fn get_or_create<F>(
        &self,
        key: TileCacheKey,
        generate: F,
    ) -> Result<CachedTile, TileError>
    where
        F: FnOnce() -> Result<RgbImage, TileError> + Send + 'static,
    {
        let path = self.path_for(&key);

        if self.enabled {
            if let Some(data) = read_if_present(&path).await? {
                debug!(path = %path.display(), "Tile served from cache");
                return Ok(CachedTile {
                    data,
                    cache_hit: true,
                });
            }
        }

        let guard = InFlightGuard::join(&self.in_flight, key);
        let result = guard
            .cell()
            .get_or_init(|| self.generate_and_store(&path, generate))
            .await
            .clone();
        drop(guard);

        result.map(|data| CachedTile {
            data,
            cache_hit: false,
        })
    }

    async fn generate_and_store<F>(&self, path: &Path, generate: F) -> Result<Bytes, TileError>
    where
        F: FnOnce() -> Result<RgbImage, TileError> + Send + 'static,
    {
        // Another generation may have finished between our lookup and
        // joining the in-flight table.
        if self.enabled {
            if let Some(data) = read_if_present(path).await? {
                return Ok(data);
            }
        }

        let encoder = self.encoder;
        let data = tokio::task::spawn_blocking(move || encoder.encode(&generate()?))
            .await
            .map_err(|e| TileError::Generation {
                message: e.to_string(),
            })??;

        write_atomic(path, &data).await?;
        info!(path = %path.display(), bytes = data.len(), "Tile created");

        Ok(data)
    }
}

/// In-flight generations with the number of callers waiting on each.
type InFlightMap = Mutex<HashMap<TileCacheKey, (InFlight, usize)>>;

fn lock_in_flight(map: &InFlightMap) -> MutexGuard<'_, HashMap<TileCacheKey, (InFlight, usize)>> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A caller's membership in the in-flight entry for one key.
///
/// The entry is removed when its last member goes away, including when a
/// request future is dropped mid-generation.
struct InFlightGuard<'a> {
    map: &'a InFlightMap,
    key: TileCacheKey,
    cell: InFlight,
}

impl<'a> InFlightGuard<'a> {
    fn join(map: &'a InFlightMap, key: TileCacheKey) -> Self {
        let mut in_flight = lock_in_flight(map);
        let (cell, members) = in_flight.entry(key.clone()).or_default();
        *members += 1;
        let cell = Arc::clone(cell);
        drop(in_flight);

        Self { map, key, cell }
    }

    fn cell(&self) -> &InFlight {
        &self.cell
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = lock_in_flight(self.map);
        if let Some((_, members)) = in_flight.get_mut(&self.key) {
            *members -= 1;
            if *members == 0 {
                in_flight.remove(&self.key);
            }
        }
    }
}

/// Read a file, mapping "not found" to `None`.
async fn read_if_present(path: &Path) -> Result<Option<Bytes>, TileError> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(Some(Bytes::from(data))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TileError::cache_io(path, &e)),
    }
}

/// Write `data` to a temporary sibling of `path`, then rename it into place.
async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), TileError> {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TileError::cache_io(parent, &e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(
        ".{}-{}.tmp",
        std::process::id(),
        SEQUENCE.fetch_add(1, Ordering::Relaxed)
    ));
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, data)
        .await
        .map_err(|e| TileError::cache_io(&tmp, &e))?;

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(TileError::cache_io(path, &e));
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
