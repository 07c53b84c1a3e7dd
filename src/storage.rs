/// Key-value persistence over chrome.storage.sync / chrome.storage.local
use serde_json::{Map, Value};

use crate::browser::{self, StorageArea};
use crate::error::Result;

/// Minimal async key-value interface shared by the settings and session stores
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Values for the keys that exist; missing keys are simply absent
    async fn get_many(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    async fn set_many(&self, items: Map<String, Value>) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut items = self.get_many(&[key]).await?;
        Ok(items.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut items = Map::new();
        items.insert(key.to_string(), value);
        self.set_many(items).await
    }
}

/// A `chrome.storage` area. When the extension context is gone (reloaded
/// under a live page) reads come back empty and writes are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeStore {
    area: StorageArea,
}

impl ChromeStore {
    pub fn sync() -> Self {
        ChromeStore {
            area: StorageArea::Sync,
        }
    }

    pub fn local() -> Self {
        ChromeStore {
            area: StorageArea::Local,
        }
    }
}

impl KeyValueStore for ChromeStore {
    async fn get_many(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        if !browser::extension_context_valid() {
            log::warn!("Extension context unavailable; reading {:?} storage as empty", self.area);
            return Ok(Map::new());
        }

        let items_js = self.area.get(keys).await?;
        if items_js.is_null() || items_js.is_undefined() {
            return Ok(Map::new());
        }
        let items: Map<String, Value> = serde_wasm_bindgen::from_value(items_js)?;
        Ok(items)
    }

    async fn set_many(&self, items: Map<String, Value>) -> Result<()> {
        if !browser::extension_context_valid() {
            log::warn!("Extension context unavailable; skipping {:?} storage write", self.area);
            return Ok(());
        }
        self.area.set(browser::to_js(&items)?).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if !browser::extension_context_valid() {
            return Ok(());
        }
        self.area.remove(&[key]).await
    }
}
