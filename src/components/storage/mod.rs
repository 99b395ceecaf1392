mod persistence;

pub use persistence::EventPersistence;

use crate::error::{corrupt_data_error, storage_error, CalendarResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

/// Local key-value store holding whole string blobs
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value under `key`, `None` when absent
    async fn get(&self, key: &str) -> CalendarResult<Option<String>>;

    /// Replace the value under `key`
    async fn set(&self, key: &str, value: &str) -> CalendarResult<()>;

    /// Remove `key`; removing an absent key succeeds
    async fn remove(&self, key: &str) -> CalendarResult<()>;

    /// Move the raw value under `from` to `to`, replacing what `to` held.
    /// Moving an absent key succeeds.
    async fn rename(&self, from: &str, to: &str) -> CalendarResult<()>;
}

/// One `<key>.json` file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> CalendarResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(storage_error(&format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> CalendarResult<Option<String>> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(&format!("Failed to read {}: {}", path.display(), e))),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| corrupt_data_error(&format!("{} is not UTF-8: {}", path.display(), e)))
    }

    async fn set(&self, key: &str, value: &str) -> CalendarResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).await?;

        // Write next to the target and rename so readers never see half a blob
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> CalendarResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn rename(&self, from: &str, to: &str) -> CalendarResult<()> {
        let (from_path, to_path) = (self.path_for(from)?, self.path_for(to)?);
        match fs::rename(&from_path, &to_path).await {
            Ok(()) => {
                debug!("Moved {} to {}", from_path.display(), to_path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory implementation of the store (for testing)
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a single value
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut values = HashMap::new();
        values.insert(key.to_string(), value.to_string());
        Self {
            values: RwLock::new(values),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> CalendarResult<Option<String>> {
        let values = self.values.read().await;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> CalendarResult<()> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> CalendarResult<()> {
        let mut values = self.values.write().await;
        values.remove(key);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> CalendarResult<()> {
        let mut values = self.values.write().await;
        if let Some(value) = values.remove(from) {
            values.insert(to.to_string(), value);
        }
        Ok(())
    }
}
