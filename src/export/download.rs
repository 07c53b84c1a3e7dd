/// Save a note as a `.md` file through a temporary blob URL
use std::time::Duration;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use super::markdown::{clipboard_markdown, download_filename};
use crate::browser;
use crate::error::{Error, Result, from_js};
use crate::note::Note;

const MARKDOWN_MIME: &str = "text/markdown;charset=utf-8";

pub fn download_markdown(note: &Note) -> Result<()> {
    let parts = js_sys::Array::of1(&JsValue::from(clipboard_markdown(note)));
    let options = BlobPropertyBag::new();
    options.set_type(MARKDOWN_MIME);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options).map_err(from_js)?;
    let url = Url::create_object_url_with_blob(&blob).map_err(from_js)?;

    let document = browser::document()?;
    let body = document
        .body()
        .ok_or_else(|| Error::Browser("document has no body".to_string()))?;
    let anchor: HtmlAnchorElement = document
        .create_element("a")
        .map_err(from_js)?
        .dyn_into()
        .map_err(|_| Error::Browser("failed to create anchor".to_string()))?;
    anchor.set_href(&url);
    anchor.set_download(&download_filename(note));
    anchor.set_attribute("style", "display: none").map_err(from_js)?;

    body.append_child(&anchor).map_err(from_js)?;
    anchor.click();
    anchor.remove();

    // The click has to be processed before the URL goes away
    wasm_bindgen_futures::spawn_local(async move {
        browser::sleep(Duration::from_millis(100)).await;
        let _ = Url::revoke_object_url(&url);
    });
    Ok(())
}
