use crate::{
    error::{LensError, Result},
    storage::traits::KeyValueStore,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Keeps every key in one JSON object on disk.
///
/// Writes go to a sibling temp file first and are renamed into place.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_object(&self) -> Result<Map<String, Value>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(LensError::StorageError(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    async fn write_object(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        let payload = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&tmp, payload).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Current contents, or a fresh object when the file is unreadable.
    async fn read_for_update(&self) -> Map<String, Value> {
        match self.read_object().await {
            Ok(map) => map,
            Err(e) => {
                log::warn!(
                    "Replacing unreadable store {}: {}",
                    self.path.display(),
                    e
                );
                Map::new()
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.read_object().await?;
        Ok(map.get(key).and_then(Value::as_str).map(String::from))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_for_update().await;
        map.insert(key.to_string(), Value::String(value));
        self.write_object(&map).await
    }
}
