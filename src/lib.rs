/// TubeWiki - Chrome Extension that turns YouTube videos into wiki notes
/// Built with Rust + WASM + Yew

mod error;
mod note;
mod youtube;
mod config;
mod browser;
mod storage;
mod settings;
mod session;
mod http;
mod auth;
mod messages;
mod proxy;
mod api;
mod poller;
mod export;
mod paste;
mod background;
pub mod ui;

#[cfg(test)]
mod testing;

use wasm_bindgen::prelude::*;

use crate::paste::{DomSurface, PasteOutcome, PendingPaste};
use crate::storage::ChromeStore;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export the URL helpers for the JavaScript loaders
#[wasm_bindgen]
pub fn is_watch_page(url: &str) -> bool {
    youtube::is_watch_page(url)
}

#[wasm_bindgen]
pub fn video_id(url: &str) -> Option<String> {
    youtube::video_id(url)
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Mount the export bar and overlay on YouTube
#[wasm_bindgen]
pub fn start_content_script() {
    if !browser::extension_context_valid() {
        log::warn!("Extension context invalidated, skipping TubeWiki injection");
        return;
    }
    if let Err(e) = ui::content::start() {
        log::error!("Failed to start TubeWiki content script: {}", e);
    }
}

// Paste a staged note into the Notion editor
#[wasm_bindgen]
pub fn start_notion_paste() {
    wasm_bindgen_futures::spawn_local(async {
        let pending = PendingPaste::new(ChromeStore::local());
        match paste::run_paste(&pending, &DomSurface, browser::sleep).await {
            Ok(PasteOutcome::NothingStaged) => {}
            Ok(outcome) => log::info!("Notion paste finished: {:?}", outcome),
            Err(e) => log::error!("Notion paste failed: {}", e),
        }
    });
}

// Service worker entry point
#[wasm_bindgen]
pub fn start_background() {
    background::start_background();
}
