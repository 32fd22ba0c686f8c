//! Streaming configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::types::Result;

/// Configuration for the chunk streaming manager
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Directory holding the region files for this world
    pub world_dir: PathBuf,
    /// Chunks within this Euclidean radius (in chunks) of the viewer are loaded
    pub visibility_radius: i32,
    /// Loaded chunks farther than this radius are evicted.
    /// Kept larger than `visibility_radius` so chunks at the boundary do not
    /// thrash between loading and unloading.
    pub unload_radius: i32,
    /// Maximum number of concurrent region file reads
    pub max_async_load: usize,
    /// Maximum number of concurrent mesh builds
    pub max_async_build: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            world_dir: PathBuf::from("world"),
            visibility_radius: 10,
            unload_radius: 15,
            max_async_load: 12,
            max_async_build: 8,
        }
    }
}

impl StreamConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)
            .map_err(|e| crate::core::Error::Corrupt(format!("config {}: {}", path.display(), e)))?;
        Ok(config)
    }
}
