use crate::error::Result;
use async_trait::async_trait;

/// String key-value persistence, the shape of a browser's local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;
}
