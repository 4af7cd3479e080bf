//! Per-process dataset memoization
//!
//! A loaded table is reused while the file keeps the same length and
//! modification time. Tables are handed out as `Arc<RecordTable>` so every
//! pipeline stage reads the same immutable copy.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::SystemTime;

use surveydash_core::RecordTable;

use crate::{load_path, LoadError};

/// File identity used to decide whether a cached table is still current
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self, LoadError> {
        let meta = std::fs::metadata(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug)]
struct CacheEntry {
    stamp: FileStamp,
    table: Arc<RecordTable>,
}

/// Loaded tables keyed by canonical path
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, CacheEntry>,
    loads: usize,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, parsing it only when it changed
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<RecordTable>, LoadError> {
        let key = path.canonicalize().map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stamp = FileStamp::of(&key)?;

        if let Some(entry) = self.entries.get(&key) {
            if entry.stamp == stamp {
                tracing::debug!(path = %key.display(), "dataset cache hit");
                return Ok(Arc::clone(&entry.table));
            }
            tracing::debug!(path = %key.display(), "dataset changed on disk, reloading");
        }

        let table = Arc::new(load_path(&key)?);
        self.loads += 1;
        self.entries.insert(
            key,
            CacheEntry {
                stamp,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Number of times a file was actually parsed
    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn global() -> &'static Mutex<DatasetCache> {
    static CACHE: OnceLock<Mutex<DatasetCache>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(DatasetCache::new()))
}

/// Load `path` through the process-wide cache
pub fn load_cached(path: &Path) -> Result<Arc<RecordTable>, LoadError> {
    let mut cache = global().lock().unwrap_or_else(PoisonError::into_inner);
    cache.get_or_load(path)
}
