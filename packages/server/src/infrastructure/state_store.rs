//! Shared key/value state, independent of any single connection.
//!
//! Last write wins, no expiry. Lives as long as the server instance.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct SharedStateStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl SharedStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning the one it replaced.
    pub async fn set(&self, key: String, value: Value) -> Option<Value> {
        self.entries.lock().await.insert(key, value)
    }

    /// `None` when the key was never set.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
