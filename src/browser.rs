/// Bindings to the `chrome.*` extension APIs and a few browser primitives
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error::{Error, Result, from_js};

mod ffi {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = get, catch)]
        pub async fn sync_get(keys: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = set, catch)]
        pub async fn sync_set(items: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = remove, catch)]
        pub async fn sync_remove(keys: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = get, catch)]
        pub async fn local_get(keys: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = set, catch)]
        pub async fn local_set(items: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = remove, catch)]
        pub async fn local_remove(keys: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = sendMessage, catch)]
        pub async fn runtime_send_message(message: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
        pub fn runtime_add_message_listener(listener: &js_sys::Function);

        #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = query, catch)]
        pub async fn tabs_query(query: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = create, catch)]
        pub async fn tabs_create(properties: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_namespace = ["chrome", "action"], js_name = setBadgeText, catch)]
        pub async fn action_set_badge_text(details: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_namespace = ["chrome", "action"], js_name = setBadgeBackgroundColor, catch)]
        pub async fn action_set_badge_background_color(details: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_namespace = ["navigator", "clipboard"], js_name = writeText, catch)]
        pub async fn clipboard_write_text(text: &str) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_name = setTimeout)]
        pub fn set_timeout(handler: &js_sys::Function, timeout: i32) -> JsValue;
    }
}

/// The two `chrome.storage` areas the extension uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    /// Synced across the user's browsers (integration settings)
    Sync,
    /// This browser only (auth session, staged paste)
    Local,
}

impl StorageArea {
    pub async fn get(self, keys: &[&str]) -> Result<JsValue> {
        let keys = to_js(&keys)?;
        let result = match self {
            StorageArea::Sync => ffi::sync_get(keys).await,
            StorageArea::Local => ffi::local_get(keys).await,
        };
        result.map_err(from_js)
    }

    pub async fn set(self, items: JsValue) -> Result<()> {
        let result = match self {
            StorageArea::Sync => ffi::sync_set(items).await,
            StorageArea::Local => ffi::local_set(items).await,
        };
        result.map(|_| ()).map_err(from_js)
    }

    pub async fn remove(self, keys: &[&str]) -> Result<()> {
        let keys = to_js(&keys)?;
        let result = match self {
            StorageArea::Sync => ffi::sync_remove(keys).await,
            StorageArea::Local => ffi::local_remove(keys).await,
        };
        result.map(|_| ()).map_err(from_js)
    }
}

/// Serialize to a plain JS object (maps become objects, not `Map`s)
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(Error::from)
}

/// `chrome.runtime.id` disappears once the extension is reloaded under a live page
pub fn extension_context_valid() -> bool {
    let global = js_sys::global();
    let lookup = |target: &JsValue, key: &str| {
        js_sys::Reflect::get(target, &JsValue::from_str(key))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
    };

    lookup(&global, "chrome")
        .and_then(|chrome| lookup(&chrome, "runtime"))
        .and_then(|runtime| lookup(&runtime, "id"))
        .is_some()
}

pub async fn send_runtime_message(message: JsValue) -> Result<JsValue> {
    if !extension_context_valid() {
        return Err(Error::ContextInvalidated);
    }
    ffi::runtime_send_message(message).await.map_err(from_js)
}

pub fn add_runtime_message_listener(listener: &js_sys::Function) {
    ffi::runtime_add_message_listener(listener);
}

#[derive(Debug, Deserialize)]
struct TabSummary {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TabQuery {
    active: bool,
    current_window: bool,
}

/// URL of the focused tab in the current window
pub async fn active_tab_url() -> Result<Option<String>> {
    let query = to_js(&TabQuery {
        active: true,
        current_window: true,
    })?;
    let tabs_js = ffi::tabs_query(query).await.map_err(from_js)?;
    let tabs: Vec<TabSummary> = serde_wasm_bindgen::from_value(tabs_js)?;
    Ok(tabs.into_iter().next().and_then(|tab| tab.url))
}

#[derive(Serialize)]
struct CreateTab<'a> {
    url: &'a str,
}

pub async fn open_tab(url: &str) -> Result<()> {
    let properties = to_js(&CreateTab { url })?;
    ffi::tabs_create(properties).await.map(|_| ()).map_err(from_js)
}

#[derive(Serialize)]
struct BadgeText<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct BadgeColor<'a> {
    color: &'a str,
}

pub async fn set_badge(text: &str, color: Option<&str>) -> Result<()> {
    ffi::action_set_badge_text(to_js(&BadgeText { text })?)
        .await
        .map_err(from_js)?;
    if let Some(color) = color {
        ffi::action_set_badge_background_color(to_js(&BadgeColor { color })?)
            .await
            .map_err(from_js)?;
    }
    Ok(())
}

pub async fn write_clipboard(text: &str) -> Result<()> {
    ffi::clipboard_write_text(text).await.map(|_| ()).map_err(from_js)
}

/// Timer-driven wait; works in windows and in the service worker
pub async fn sleep(duration: Duration) {
    let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        ffi::set_timeout(&resolve, millis);
    });
    let _ = JsFuture::from(promise).await;
}

pub fn now_unix_seconds() -> i64 {
    (js_sys::Date::now() / 1000.0) as i64
}

/// `YYYY-MM-DD` in UTC
pub fn today_iso_date() -> String {
    let iso: String = js_sys::Date::new_0().to_iso_string().into();
    iso.chars().take(10).collect()
}

pub fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| Error::Browser("no window in this context".to_string()))
}

pub fn document() -> Result<web_sys::Document> {
    window()?
        .document()
        .ok_or_else(|| Error::Browser("no document in this context".to_string()))
}

/// `window.open`; `_blank` for web pages, `_self` for app URIs like `obsidian://`
pub fn open_window(url: &str, target: &str) -> Result<()> {
    window()?
        .open_with_url_and_target(url, target)
        .map(|_| ())
        .map_err(from_js)
}

pub fn alert(message: &str) {
    if let Ok(window) = window() {
        let _ = window.alert_with_message(message);
    }
}
