//! Cached, lock-guarded access to a single versioned config file.
//!
//! The free functions in [`crate::codec`] hold no state. `ConfigStore` adds the
//! two things multi-threaded callers usually want on top of them: a cached copy
//! of the last loaded record and a read/write lock that serializes saves
//! against loads of the same file. `update` and `load_or_create` hold the
//! exclusive lock across their whole read-modify-write. The cache is filled
//! on first load and dropped on every successful save.

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::validate::Versioned;
use arc_swap::ArcSwapOption;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// A versioned config file with an in-memory cache.
pub struct ConfigStore<T> {
    path: PathBuf,
    codec: Codec,
    cache: ArcSwapOption<T>,
    lock: RwLock<()>,
}

impl<T> ConfigStore<T>
where
    T: Versioned + Serialize + DeserializeOwned,
{
    /// Create a store for `path`. No I/O happens until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_codec(path, Codec::default())
    }

    pub fn with_codec(path: impl Into<PathBuf>, codec: Codec) -> Self {
        Self {
            path: path.into(),
            codec,
            cache: ArcSwapOption::empty(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Version of the file on disk. Never served from the cache.
    pub fn peek_version(&self) -> Result<String> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        self.codec.peek_version(&self.path)
    }

    /// The cached record, loading it from disk on first use.
    pub fn load(&self) -> Result<Arc<T>> {
        if let Some(cached) = self.cache.load_full() {
            return Ok(cached);
        }

        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        // A concurrent load may have filled the cache while we waited
        if let Some(cached) = self.cache.load_full() {
            return Ok(cached);
        }
        self.load_locked()
    }

    /// Save `record` and drop the cached copy.
    pub fn save(&self, record: &T) -> Result<()> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        self.save_locked(record)
    }

    /// Read the file, apply `update` and save the result, all under the
    /// exclusive lock. Returns the saved record.
    pub fn update<F>(&self, update: F) -> Result<T>
    where
        T: Clone,
        F: FnOnce(&mut T),
    {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        let mut record = T::clone(&*self.load_locked()?);
        update(&mut record);
        self.save_locked(&record)?;
        Ok(record)
    }

    /// Load the record, or save and return `init()` if the file is absent.
    ///
    /// The check and the create happen under the exclusive lock, so two
    /// callers never both create the file.
    pub fn load_or_create<F>(&self, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> T,
    {
        if let Some(cached) = self.cache.load_full() {
            return Ok(cached);
        }

        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        match self.load_locked() {
            Ok(record) => Ok(record),
            Err(err) if err.is_not_found() => {
                let record = init();
                info!(
                    path = %self.path.display(),
                    version = record.version(),
                    "creating new config"
                );
                self.save_locked(&record)?;
                Ok(Arc::new(record))
            }
            Err(err) => Err(err),
        }
    }

    /// Drop the cached record so the next load reads from disk.
    pub fn invalidate(&self) {
        self.cache.store(None);
    }

    /// Remove the config file and the cached record. A missing file is fine.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        self.cache.store(None);
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Io {
                path: self.path.clone(),
                source: err,
            }),
        }
    }

    /// Whether a record is currently cached.
    pub fn is_cached(&self) -> bool {
        self.cache.load().is_some()
    }

    // Callers hold `lock`, shared or exclusive.
    fn load_locked(&self) -> Result<Arc<T>> {
        let record = Arc::new(self.codec.load::<T, _>(&self.path)?);
        debug!(path = %self.path.display(), version = record.version(), "cached config");
        self.cache.store(Some(Arc::clone(&record)));
        Ok(record)
    }

    // Callers hold `lock` exclusively.
    fn save_locked(&self, record: &T) -> Result<()> {
        self.codec.save(record, &self.path)?;
        self.cache.store(None);
        Ok(())
    }
}

impl<T> std::fmt::Debug for ConfigStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("codec", &self.codec)
            .field("cached", &self.cache.load().is_some())
            .finish()
    }
}
