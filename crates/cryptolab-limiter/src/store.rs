//! String key-value persistence behind the local limiter (browser
//! `localStorage` in WASM, a map in memory elsewhere).

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::LimiterError;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, LimiterError>;
    fn set(&self, key: &str, value: &str) -> Result<(), LimiterError>;
    fn remove(&self, key: &str) -> Result<(), LimiterError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, LimiterError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LimiterError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LimiterError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
