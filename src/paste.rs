/// Auto-paste relay: a staged markdown payload is written into the Notion
/// editor when the Notion tab opened by the export bar finishes loading.
use std::future::Future;
use std::time::Duration;

use wasm_bindgen::JsCast;
use web_sys::{Event, EventInit, HtmlElement, InputEvent, InputEventInit};

use crate::browser;
use crate::error::{Error, Result, from_js};
use crate::session::SessionStore;
use crate::settings::IntegrationSettings;
use crate::storage::KeyValueStore;

pub const PENDING_PASTE_KEY: &str = "pending_notion_paste";
pub const EDITOR_SELECTORS: [&str; 2] = [".notion-page-content", r#"[contenteditable="true"]"#];
pub const FIND_ATTEMPTS: u32 = 20;
pub const FIND_INTERVAL: Duration = Duration::from_millis(500);
pub const FOCUS_DELAY: Duration = Duration::from_millis(200);

const NOTION_HOME: &str = "https://www.notion.so/";

/// Page the hand-off opens: the configured parent page, or Notion's home
pub fn notion_paste_url(settings: &IntegrationSettings) -> String {
    match settings.notion_page_id() {
        Some(page_id) => format!("{}{}", NOTION_HOME, page_id.replace('-', "")),
        None => NOTION_HOME.to_string(),
    }
}

/// The single staged payload in the local store
pub struct PendingPaste<S> {
    sessions: SessionStore<S>,
}

impl<S: KeyValueStore> PendingPaste<S> {
    pub fn new(store: S) -> Self {
        PendingPaste {
            sessions: SessionStore::new(store),
        }
    }

    /// Replaces whatever was staged before
    pub async fn stage(&self, markdown: &str) -> Result<()> {
        self.sessions.set_item(PENDING_PASTE_KEY, markdown).await
    }

    /// Staged payload without consuming it; empty strings count as nothing
    pub async fn peek(&self) -> Result<Option<String>> {
        Ok(self
            .sessions
            .get_item(PENDING_PASTE_KEY)
            .await?
            .filter(|payload| !payload.is_empty()))
    }

    pub async fn clear(&self) -> Result<()> {
        self.sessions.remove_item(PENDING_PASTE_KEY).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    NothingStaged,
    Inserted,
    CopiedToClipboard,
    EditorMissing,
    Failed(String),
}

impl PasteOutcome {
    /// The payload is consumed once the user has it one way or another
    pub fn should_clear(&self) -> bool {
        matches!(self, PasteOutcome::Inserted | PasteOutcome::CopiedToClipboard)
    }
}

/// Probe up to `attempts` times, sleeping `interval` between misses
pub async fn wait_for<T, F, Z, ZFut>(mut lookup: F, attempts: u32, interval: Duration, sleep: Z) -> Option<T>
where
    F: FnMut() -> Option<T>,
    Z: Fn(Duration) -> ZFut,
    ZFut: Future<Output = ()>,
{
    for attempt in 1..=attempts {
        if let Some(found) = lookup() {
            return Some(found);
        }
        if attempt < attempts {
            log::debug!("Editor not found, retrying ({}/{})", attempt, attempts);
            sleep(interval).await;
        }
    }
    None
}

/// The page the payload is pasted into
#[allow(async_fn_in_trait)]
pub trait PasteSurface {
    type Editor;

    fn find_editor(&self) -> Option<Self::Editor>;
    fn focus(&self, editor: &Self::Editor);
    fn insert_text(&self, editor: &Self::Editor, text: &str) -> Result<()>;
    async fn copy_to_clipboard(&self, text: &str) -> Result<()>;
    fn toast(&self, message: &str);
    fn alert(&self, message: &str);
}

/// Paste the staged payload if there is one
pub async fn run_paste<S, D, Z, ZFut>(pending: &PendingPaste<S>, surface: &D, sleep: Z) -> Result<PasteOutcome>
where
    S: KeyValueStore,
    D: PasteSurface,
    Z: Fn(Duration) -> ZFut,
    ZFut: Future<Output = ()>,
{
    let Some(payload) = pending.peek().await? else {
        log::info!("No pending content found");
        return Ok(PasteOutcome::NothingStaged);
    };

    let Some(editor) = wait_for(|| surface.find_editor(), FIND_ATTEMPTS, FIND_INTERVAL, &sleep).await else {
        log::error!("Could not find Notion editor after {} attempts", FIND_ATTEMPTS);
        surface.alert("TubeWiki: Failed to find Notion editor. Please paste manually.");
        return Ok(PasteOutcome::EditorMissing);
    };

    surface.focus(&editor);
    sleep(FOCUS_DELAY).await;

    let outcome = match surface.insert_text(&editor, &payload) {
        Ok(()) => {
            surface.toast("✅ Content pasted automatically!");
            PasteOutcome::Inserted
        }
        Err(e) => {
            log::error!("Direct insertion failed: {}", e);
            match surface.copy_to_clipboard(&payload).await {
                Ok(()) => {
                    surface.toast("📋 Content copied! Press Cmd+V to paste.");
                    PasteOutcome::CopiedToClipboard
                }
                Err(e) => {
                    log::error!("Clipboard fallback also failed: {}", e);
                    surface.toast("❌ Please reload and try again.");
                    PasteOutcome::Failed(e.to_string())
                }
            }
        }
    };

    if outcome.should_clear() {
        pending.clear().await?;
    }
    Ok(outcome)
}

/// The live Notion document
pub struct DomSurface;

impl PasteSurface for DomSurface {
    type Editor = HtmlElement;

    fn find_editor(&self) -> Option<HtmlElement> {
        let document = browser::document().ok()?;
        let root = EDITOR_SELECTORS
            .iter()
            .find_map(|selector| document.query_selector(selector).ok().flatten())?;
        // The page container wraps the element that actually accepts input
        let editable = root
            .query_selector(EDITOR_SELECTORS[1])
            .ok()
            .flatten()
            .unwrap_or(root);
        editable.dyn_into::<HtmlElement>().ok()
    }

    fn focus(&self, editor: &HtmlElement) {
        let _ = editor.focus();
    }

    fn insert_text(&self, editor: &HtmlElement, text: &str) -> Result<()> {
        editor.set_inner_text("");
        editor.set_inner_text(text);

        let input_init = InputEventInit::new();
        input_init.set_bubbles(true);
        input_init.set_cancelable(true);
        input_init.set_input_type("insertText");
        input_init.set_data(Some(text));
        let input = InputEvent::new_with_event_init_dict("input", &input_init).map_err(from_js)?;
        editor.dispatch_event(&input).map_err(from_js)?;

        let change_init = EventInit::new();
        change_init.set_bubbles(true);
        let change = Event::new_with_event_init_dict("change", &change_init).map_err(from_js)?;
        editor.dispatch_event(&change).map_err(from_js)?;
        Ok(())
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        crate::export::clipboard::copy_text(text).await
    }

    fn toast(&self, message: &str) {
        if let Err(e) = show_toast(message) {
            log::warn!("Failed to show toast: {}", e);
        }
    }

    fn alert(&self, message: &str) {
        browser::alert(message);
    }
}

const TOAST_STYLE: &str = "position: fixed; bottom: 20px; right: 20px; \
    background-color: #065fd4; color: white; padding: 12px 24px; \
    border-radius: 8px; z-index: 9999; box-shadow: 0 4px 12px rgba(0,0,0,0.15); \
    font-family: sans-serif;";

fn show_toast(message: &str) -> Result<()> {
    let document = browser::document()?;
    let body = document
        .body()
        .ok_or_else(|| Error::Browser("document has no body".to_string()))?;
    let toast = document.create_element("div").map_err(from_js)?;
    toast.set_attribute("style", TOAST_STYLE).map_err(from_js)?;
    toast.set_text_content(Some(message));
    body.append_child(&toast).map_err(from_js)?;

    wasm_bindgen_futures::spawn_local(async move {
        browser::sleep(Duration::from_secs(5)).await;
        toast.remove();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeSurface {
        editor_after: u32,
        lookups: Cell<u32>,
        insert_fails: bool,
        clipboard_fails: bool,
        inserted: RefCell<Option<String>>,
        copied: RefCell<Option<String>>,
        toasts: RefCell<Vec<String>>,
        alerts: RefCell<Vec<String>>,
        focused: Cell<bool>,
    }

    impl PasteSurface for FakeSurface {
        type Editor = ();

        fn find_editor(&self) -> Option<()> {
            self.lookups.set(self.lookups.get() + 1);
            (self.lookups.get() > self.editor_after).then_some(())
        }

        fn focus(&self, _: &()) {
            self.focused.set(true);
        }

        fn insert_text(&self, _: &(), text: &str) -> Result<()> {
            if self.insert_fails {
                return Err(Error::Browser("read-only".to_string()));
            }
            *self.inserted.borrow_mut() = Some(text.to_string());
            Ok(())
        }

        async fn copy_to_clipboard(&self, text: &str) -> Result<()> {
            if self.clipboard_fails {
                return Err(Error::Browser("denied".to_string()));
            }
            *self.copied.borrow_mut() = Some(text.to_string());
            Ok(())
        }

        fn toast(&self, message: &str) {
            self.toasts.borrow_mut().push(message.to_string());
        }

        fn alert(&self, message: &str) {
            self.alerts.borrow_mut().push(message.to_string());
        }
    }

    fn staged(payload: &str) -> PendingPaste<MemoryStore> {
        let pending = PendingPaste::new(MemoryStore::new());
        block_on(pending.stage(payload)).unwrap();
        pending
    }

    fn no_sleep(_: Duration) -> std::future::Ready<()> {
        std::future::ready(())
    }

    #[test]
    fn test_notion_paste_url() {
        assert_eq!(notion_paste_url(&IntegrationSettings::default()), "https://www.notion.so/");
        let settings = IntegrationSettings {
            notion_page_id: Some("1a2b-3c4d".to_string()),
            ..Default::default()
        };
        assert_eq!(notion_paste_url(&settings), "https://www.notion.so/1a2b3c4d");
    }

    #[test]
    fn test_stage_replaces_previous_payload() {
        let pending = staged("# First");
        block_on(pending.stage("# Second")).unwrap();

        assert_eq!(block_on(pending.peek()).unwrap().as_deref(), Some("# Second"));
    }

    #[test]
    fn test_wait_for_counts_lookups() {
        let lookups = Cell::new(0);
        let sleeps = Cell::new(0);

        let found = block_on(wait_for(
            || {
                lookups.set(lookups.get() + 1);
                None::<()>
            },
            FIND_ATTEMPTS,
            FIND_INTERVAL,
            |_| {
                sleeps.set(sleeps.get() + 1);
                std::future::ready(())
            },
        ));

        assert_eq!(found, None);
        assert_eq!(lookups.get(), 20);
        assert_eq!(sleeps.get(), 19);
    }

    #[test]
    fn test_nothing_staged_stops_early() {
        let pending = PendingPaste::new(MemoryStore::new());
        let surface = FakeSurface::default();

        let outcome = block_on(run_paste(&pending, &surface, no_sleep)).unwrap();

        assert_eq!(outcome, PasteOutcome::NothingStaged);
        assert_eq!(surface.lookups.get(), 0);
    }

    #[test]
    fn test_inserts_and_clears_payload() {
        let pending = staged("# Note\n\nBody");
        let surface = FakeSurface {
            editor_after: 3,
            ..Default::default()
        };

        let outcome = block_on(run_paste(&pending, &surface, no_sleep)).unwrap();

        assert_eq!(outcome, PasteOutcome::Inserted);
        assert!(surface.focused.get());
        assert_eq!(surface.lookups.get(), 4);
        assert_eq!(surface.inserted.borrow().as_deref(), Some("# Note\n\nBody"));
        assert_eq!(block_on(pending.peek()).unwrap(), None);
    }

    #[test]
    fn test_waits_after_focus() {
        let pending = staged("# Note");
        let surface = FakeSurface::default();
        let slept = RefCell::new(Vec::new());

        block_on(run_paste(&pending, &surface, |d| {
            slept.borrow_mut().push(d);
            std::future::ready(())
        }))
        .unwrap();

        assert_eq!(*slept.borrow(), vec![FOCUS_DELAY]);
    }

    #[test]
    fn test_insert_failure_falls_back_to_clipboard() {
        let pending = staged("# Note");
        let surface = FakeSurface {
            insert_fails: true,
            ..Default::default()
        };

        let outcome = block_on(run_paste(&pending, &surface, no_sleep)).unwrap();

        assert_eq!(outcome, PasteOutcome::CopiedToClipboard);
        assert_eq!(surface.copied.borrow().as_deref(), Some("# Note"));
        assert_eq!(
            surface.toasts.borrow().as_slice(),
            ["📋 Content copied! Press Cmd+V to paste."]
        );
        assert_eq!(block_on(pending.peek()).unwrap(), None);
    }

    #[test]
    fn test_total_failure_keeps_payload() {
        let pending = staged("# Note");
        let surface = FakeSurface {
            insert_fails: true,
            clipboard_fails: true,
            ..Default::default()
        };

        let outcome = block_on(run_paste(&pending, &surface, no_sleep)).unwrap();

        assert!(matches!(outcome, PasteOutcome::Failed(_)));
        assert_eq!(block_on(pending.peek()).unwrap().as_deref(), Some("# Note"));
    }

    #[test]
    fn test_missing_editor_alerts_and_keeps_payload() {
        let pending = staged("# Note");
        let surface = FakeSurface {
            editor_after: u32::MAX,
            ..Default::default()
        };

        let outcome = block_on(run_paste(&pending, &surface, no_sleep)).unwrap();

        assert_eq!(outcome, PasteOutcome::EditorMissing);
        assert_eq!(surface.lookups.get(), FIND_ATTEMPTS);
        assert_eq!(surface.alerts.borrow().len(), 1);
        assert_eq!(surface.inserted.borrow().as_deref(), None);
        assert_eq!(block_on(pending.peek()).unwrap().as_deref(), Some("# Note"));
    }
}
