/// Error types shared by every extension context
use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Not signed in: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Note not found")]
    NotFound,

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Note generation failed: {0}")]
    NoteFailed(String),

    #[error("{0}")]
    Config(String),

    #[error("Timeout waiting for note generation")]
    Timeout,

    #[error("Extension was updated or reloaded. Please refresh the page.")]
    ContextInvalidated,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Browser API error: {0}")]
    Browser(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for Error {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

/// Marker Chrome puts in every error raised after the extension was reloaded
pub const CONTEXT_INVALIDATED_MARKER: &str = "Extension context invalidated";

/// Best-effort text of a thrown JS value (Error.message, a string, or its debug form)
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Convert a rejected browser promise into an [`Error`]
pub fn from_js(value: JsValue) -> Error {
    let message = js_error_message(&value);
    if message.contains(CONTEXT_INVALIDATED_MARKER) {
        Error::ContextInvalidated
    } else {
        Error::Browser(message)
    }
}

impl Error {
    /// Whether this error is "no note yet" rather than a real failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}
