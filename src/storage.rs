//! A small key/value storage abstraction. The expense store keeps its whole collection under a
//! single key, the way a browser page would use local storage.

use crate::{utils, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// A place to persist string values by key.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Returns the value stored under `key`, or `None` if nothing has been stored yet.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`.
    async fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `{dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The file that holds `key`.
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl Storage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        trace!("Reading {}", path.display());
        utils::read_optional(&path).await
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key);
        trace!("Writing {} bytes to {}", value.len(), path.display());
        utils::write_replace(&path, value).await
    }
}

/// Holds values in memory. Clones share the same map, so a test can hand one clone to a store and
/// keep another to inspect or to open a second store over the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `key` with `value`, e.g. to simulate a corrupt payload.
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage.put(key, value);
        storage
    }

    pub fn put(&self, key: &str, value: &str) {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.get(key).cloned()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.put(key, value);
        Ok(())
    }
}
