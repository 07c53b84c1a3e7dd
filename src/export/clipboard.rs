/// Copy a note to the system clipboard
///
/// `navigator.clipboard` rejects once the click's user activation has expired
/// (a long generation wait is enough), so a rejected write falls back to a
/// hidden textarea and `document.execCommand("copy")`.
use std::future::Future;

use wasm_bindgen::JsCast;
use web_sys::HtmlTextAreaElement;

use super::markdown::clipboard_markdown;
use crate::browser;
use crate::error::{Error, Result, from_js};
use crate::note::Note;

const HIDDEN_TEXTAREA_STYLE: &str = "position: fixed; top: 0; left: 0; opacity: 0;";

pub async fn copy_to_clipboard(note: &Note) -> Result<()> {
    copy_text(&clipboard_markdown(note)).await
}

pub async fn copy_text(text: &str) -> Result<()> {
    copy_text_with(text, browser::write_clipboard, copy_via_textarea).await
}

/// Try `write`, then `fallback`; the fallback's error wins when both fail
pub async fn copy_text_with<'a, W, WFut, F>(text: &'a str, write: W, fallback: F) -> Result<()>
where
    W: FnOnce(&'a str) -> WFut,
    WFut: Future<Output = Result<()>>,
    F: FnOnce(&str) -> Result<()>,
{
    match write(text).await {
        Ok(()) => Ok(()),
        Err(e) => {
            log::warn!("Clipboard API write failed, using textarea fallback: {}", e);
            fallback(text)
        }
    }
}

fn copy_via_textarea(text: &str) -> Result<()> {
    let document = browser::document()?;
    let body = document
        .body()
        .ok_or_else(|| Error::Browser("document has no body".to_string()))?;
    let textarea: HtmlTextAreaElement = document
        .create_element("textarea")
        .map_err(from_js)?
        .dyn_into()
        .map_err(|_| Error::Browser("failed to create textarea".to_string()))?;
    textarea.set_value(text);
    textarea
        .set_attribute("style", HIDDEN_TEXTAREA_STYLE)
        .map_err(from_js)?;

    body.append_child(&textarea).map_err(from_js)?;
    textarea.select();
    let copied = document
        .unchecked_ref::<web_sys::HtmlDocument>()
        .exec_command("copy").map_err(from_js);
    textarea.remove();

    match copied? {
        true => Ok(()),
        false => Err(Error::Browser("Copy command was rejected".to_string())),
    }
}
