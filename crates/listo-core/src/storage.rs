//! Durable key/value storage boundary.
//!
//! The host platform provides the actual backing store; the core only ever
//! reads and writes one JSON blob per key.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::CoreError;

/// Async key/value storage over JSON-serialized payloads.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    async fn set(&self, key: &str, value: String) -> Result<(), CoreError>;
}

/// In-memory implementation, for tests and embedders without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
