/// String-valued storage adapter for the auth session and staged payloads
use serde_json::Value;

use crate::error::Result;
use crate::storage::KeyValueStore;

/// get/set/remove of string values, backed by the local (non-synced) store
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        SessionStore { store }
    }

    /// Non-string values are treated as absent
    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(match self.store.get(key).await? {
            Some(Value::String(value)) => Some(value),
            _ => None,
        })
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, Value::String(value.to_string())).await
    }

    pub async fn remove_item(&self, key: &str) -> Result<()> {
        self.store.remove(key).await
    }
}
