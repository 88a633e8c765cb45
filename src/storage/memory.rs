use crate::{error::Result, storage::traits::KeyValueStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }
}
