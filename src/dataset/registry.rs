//! Read-only registry of loaded datasets.
//!
//! The registry is built once at startup, then shared behind an `Arc`.
//! Nothing mutates it afterwards, so lookups need no locking.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::Dataset;
use crate::error::DatasetError;

/// File extension of dataset files.
pub const DATASET_EXTENSION: &str = "bin";

/// Name of the synthesised union of all loaded datasets.
pub const UNION_DATASET: &str = "all_isbns";

/// Registry of datasets keyed by name.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    datasets: BTreeMap<String, Arc<Dataset>>,
}

impl DatasetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset, replacing any dataset with the same name.
    pub fn insert(&mut self, dataset: Dataset) {
        self.datasets
            .insert(dataset.name().to_string(), Arc::new(dataset));
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.insert(dataset);
        self
    }

    /// Load every `*.bin` file in `dir`.
    ///
    /// When more than one dataset is found and none is named
    /// [`UNION_DATASET`], the union of all of them is added under that name.
    pub async fn load_dir(dir: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let dir = dir.as_ref();
        let io_err = |path: &Path, e: std::io::Error| DatasetError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| io_err(dir, e))?;
        let mut registry = Self::new();

        while let Some(entry) = entries.next_entry().await.map_err(|e| io_err(dir, e))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DATASET_EXTENSION) {
                continue;
            }

            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| is_valid_name(s))
                .ok_or_else(|| DatasetError::InvalidName(path.display().to_string()))?
                .to_string();

            let data = tokio::fs::read(&path).await.map_err(|e| io_err(&path, e))?;
            let dataset = Dataset::from_bytes(name, &path, &data)?;
            debug!(
                dataset = dataset.name(),
                points = dataset.len(),
                "Loaded dataset"
            );
            registry.insert(dataset);
        }

        if registry.len() > 1 && !registry.contains(UNION_DATASET) {
            let union = Dataset::union(UNION_DATASET, registry.datasets.values().map(|d| d.as_ref()));
            info!(points = union.len(), "Built {} from {} datasets", UNION_DATASET, registry.len());
            registry.insert(union);
        }

        Ok(registry)
    }

    /// Get a dataset by name.
    pub fn get(&self, name: &str) -> Option<Arc<Dataset>> {
        self.datasets.get(name).cloned()
    }

    /// Whether a dataset with this name is loaded.
    pub fn contains(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    /// Iterate datasets in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Dataset>> {
        self.datasets.values()
    }

    /// Number of loaded datasets.
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Whether no datasets are loaded.
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// Dataset names become URL and cache path segments.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
