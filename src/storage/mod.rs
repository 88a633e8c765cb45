pub mod file;
pub mod memory;
pub mod traits;

use crate::{
    config::Config,
    error::Result,
    models::{History, HistoryEntry},
};
use std::sync::Arc;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;

/// Loads and saves the gallery under one namespace key.
#[derive(Clone)]
pub struct HistoryCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl HistoryCache {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(JsonFileStore::new(config.history_path.clone())),
            config.history_key.clone(),
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Missing or unreadable data yields an empty gallery, never an error.
    pub async fn load(&self) -> History {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::debug!("No saved history under '{}'", self.key);
                return History::new();
            }
            Err(e) => {
                log::warn!("Could not read history '{}': {}", self.key, e);
                return History::new();
            }
        };

        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(entries) => {
                let history = History::from_entries(entries);
                log::info!("Loaded {} history entries", history.len());
                history
            }
            Err(e) => {
                log::warn!("Discarding corrupt history '{}': {}", self.key, e);
                History::new()
            }
        }
    }

    pub async fn persist(&self, history: &History) -> Result<()> {
        let raw = serde_json::to_string(history)?;
        self.store.set(&self.key, raw).await?;
        log::debug!("Persisted {} history entries", history.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history::tests::entry;
    use crate::models::HISTORY_CAP;

    fn cache() -> (Arc<MemoryStore>, HistoryCache) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), HistoryCache::new(store, "banana_lens_v2"))
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (_, cache) = cache();
        let history = History::new().append(vec![entry("2"), entry("1")]);
        cache.persist(&history).await.unwrap();
        assert_eq!(cache.load().await, history);
    }

    #[tokio::test]
    async fn test_missing_value_is_empty() {
        let (_, cache) = cache();
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_values_are_discarded() {
        let (store, cache) = cache();
        for raw in ["{oops", "{\"id\": 1}", "[{\"id\": \"x\"}]", "42"] {
            store.set("banana_lens_v2", raw.to_string()).await.unwrap();
            assert!(cache.load().await.is_empty(), "accepted {}", raw);
        }
    }

    #[tokio::test]
    async fn test_oversized_saved_history_is_capped() {
        let (store, cache) = cache();
        let entries: Vec<_> = (0..100).map(|i| entry(&i.to_string())).collect();
        store
            .set("banana_lens_v2", serde_json::to_string(&entries).unwrap())
            .await
            .unwrap();
        let history = cache.load().await;
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history.entries()[0].id, "0");
    }

    #[tokio::test]
    async fn test_file_backed_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new().with_history_path(dir.path().join("history.json"));
        let cache = HistoryCache::from_config(&config);
        let history = History::new().append(vec![entry("a")]);
        cache.persist(&history).await.unwrap();

        let reopened = HistoryCache::from_config(&config);
        assert_eq!(reopened.load().await, history);
    }
}
