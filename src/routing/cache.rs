//! Route table cache.
//!
//! # Data Flow
//! ```text
//! routes:cache
//!     → Collector (providers) → Collection
//!     → RouteCache::from_collection → write (temp file + rename)
//!
//! boot with routing.use_cache
//!     → RouteCache::read (version check)
//!     → into_collection (recompile every definition)
//! ```
//!
//! # Design Decisions
//! - Plain JSON, versioned; a version mismatch is a boot error, never a guess
//! - Writes are atomic so a running watcher never sees half a file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::collection::Collection;
use crate::routing::error::RoutingError;
use crate::routing::route::RouteDefinition;

/// Current cache format version.
pub const CACHE_VERSION: u32 = 1;

/// Errors reading or writing the cache file.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("route cache {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed route cache: {0}")]
    Format(#[from] serde_json::Error),

    #[error("route cache version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// On-disk route table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCache {
    pub version: u32,
    pub routes: Vec<RouteDefinition>,
}

impl RouteCache {
    pub fn from_collection(collection: &Collection) -> Self {
        Self {
            version: CACHE_VERSION,
            routes: collection.definitions(),
        }
    }

    pub fn to_json(&self) -> Result<String, CacheError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        let cache: RouteCache = serde_json::from_str(json)?;
        if cache.version != CACHE_VERSION {
            return Err(CacheError::Version {
                found: cache.version,
                expected: CACHE_VERSION,
            });
        }
        Ok(cache)
    }

    /// Write atomically: sibling temp file, then rename over `path`.
    pub fn write(&self, path: &Path) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, self.to_json()?).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;

        tracing::debug!(path = %path.display(), routes = self.routes.len(), "Route cache written");
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, CacheError> {
        let json = fs::read_to_string(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Recompile the stored definitions.
    pub fn into_collection(self) -> Result<Collection, RoutingError> {
        Collection::from_definitions(&self.routes)
    }
}

/// Read and compile a cache file in one step.
pub fn load(path: &Path) -> Result<Collection, RoutingError> {
    let collection = RouteCache::read(path)?.into_collection()?;
    tracing::info!(path = %path.display(), routes = collection.len(), "Route table loaded from cache");
    Ok(collection)
}
