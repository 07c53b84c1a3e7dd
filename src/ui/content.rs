/// Content script mounting: the export bar and overlay live in a shadow root
/// that follows YouTube's single-page navigation.
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, ShadowRootInit, ShadowRootMode};
use yew::AppHandle;
use yew::prelude::*;

use super::Services;
use super::export_bar::ExportBar;
use super::overlay::Overlay;
use crate::browser;
use crate::error::{Error, Result, from_js};
use crate::youtube;

pub const ROOT_ID: &str = "tubewiki-export-bar-root";
const VIDEO_ATTR: &str = "data-video-url";
const STYLE: &str = include_str!("../../extension/content.css");

/// Events YouTube fires (or the browser fires) when the page URL changes
const NAVIGATION_EVENTS: [&str; 2] = ["yt-navigate-finish", "popstate"];

/// One navigation can fire both events; only the last one in this window syncs
const NAVIGATION_DEBOUNCE: Duration = Duration::from_millis(150);

/// Hands out tickets; only the most recent ticket is still live
#[derive(Debug, Clone, Default)]
pub struct Debounce(Rc<Cell<u64>>);

impl Debounce {
    pub fn arm(&self) -> u64 {
        let ticket = self.0.get() + 1;
        self.0.set(ticket);
        ticket
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        self.0.get() == ticket
    }
}

#[derive(Properties, PartialEq)]
pub struct ContentAppProps {
    pub video_url: String,
}

#[function_component(ContentApp)]
pub fn content_app(props: &ContentAppProps) -> Html {
    let services = use_memo((), |_| Services::from_build_env(false));

    match &*services {
        Ok(services) => html! {
            <ContextProvider<Services> context={services.clone()}>
                <ExportBar video_url={props.video_url.clone()} />
                <Overlay video_url={props.video_url.clone()} />
            </ContextProvider<Services>>
        },
        Err(e) => {
            log::error!("TubeWiki is not configured: {}", e);
            html! {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Keep,
    Mount(String),
    Remount(String),
    Unmount,
    Nothing,
}

/// What to do with the surfaces given the page URL and what is mounted now
pub fn plan_sync(page_url: &str, mounted: Option<&str>) -> SyncAction {
    let video_url = youtube::is_watch_page(page_url)
        .then(|| youtube::canonicalize(page_url))
        .flatten();

    match (video_url, mounted) {
        (Some(video), Some(current)) if video == current => SyncAction::Keep,
        (Some(video), Some(_)) => SyncAction::Remount(video),
        (Some(video), None) => SyncAction::Mount(video),
        (None, Some(_)) => SyncAction::Unmount,
        (None, None) => SyncAction::Nothing,
    }
}

thread_local! {
    static MOUNTED: RefCell<Option<(AppHandle<ContentApp>, Element)>> = const { RefCell::new(None) };
}

fn unmount() {
    if let Some((handle, container)) = MOUNTED.with(|mounted| mounted.borrow_mut().take()) {
        handle.destroy();
        container.remove();
    }
}

fn mount(video_url: String) -> Result<()> {
    let document = browser::document()?;
    let body = document
        .body()
        .ok_or_else(|| Error::Browser("document has no body".to_string()))?;

    let container = document.create_element("div").map_err(from_js)?;
    container.set_id(ROOT_ID);
    container.set_attribute(VIDEO_ATTR, &video_url).map_err(from_js)?;
    body.append_child(&container).map_err(from_js)?;

    let shadow = container
        .attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open))
        .map_err(from_js)?;
    let style = document.create_element("style").map_err(from_js)?;
    style.set_text_content(Some(STYLE));
    shadow.append_child(&style).map_err(from_js)?;

    let app_root = document.create_element("div").map_err(from_js)?;
    shadow.append_child(&app_root).map_err(from_js)?;

    let handle = yew::Renderer::<ContentApp>::with_root_and_props(app_root, ContentAppProps { video_url })
        .render();
    MOUNTED.with(|mounted| *mounted.borrow_mut() = Some((handle, container)));
    Ok(())
}

fn mounted_video() -> Option<String> {
    MOUNTED.with(|mounted| {
        mounted
            .borrow()
            .as_ref()
            .and_then(|(_, container)| container.get_attribute(VIDEO_ATTR))
    })
}

/// Bring the mounted surfaces in line with the current page
pub fn sync_with_location() -> Result<()> {
    let href = browser::window()?.location().href().map_err(from_js)?;
    let mounted = mounted_video();

    match plan_sync(&href, mounted.as_deref()) {
        SyncAction::Keep | SyncAction::Nothing => Ok(()),
        SyncAction::Unmount => {
            log::debug!("Left watch page, removing export bar");
            unmount();
            Ok(())
        }
        SyncAction::Mount(video_url) => mount(video_url),
        SyncAction::Remount(video_url) => {
            unmount();
            mount(video_url)
        }
    }
}

pub fn start() -> Result<()> {
    // A previous injection (e.g. before an extension reload) may still be in the page
    if let Some(stale) = browser::document()?.get_element_by_id(ROOT_ID) {
        if mounted_video().is_none() {
            stale.remove();
        }
    }

    let debounce = Debounce::default();
    let on_navigate = Closure::wrap(Box::new(move || {
        let ticket = debounce.arm();
        let debounce = debounce.clone();
        spawn_local(async move {
            browser::sleep(NAVIGATION_DEBOUNCE).await;
            if !debounce.is_latest(ticket) {
                return;
            }
            if let Err(e) = sync_with_location() {
                log::error!("Failed to update TubeWiki surfaces: {}", e);
            }
        });
    }) as Box<dyn Fn()>);

    let window = browser::window()?;
    for event in NAVIGATION_EVENTS {
        window
            .add_event_listener_with_callback(event, on_navigate.as_ref().unchecked_ref())
            .map_err(from_js)?;
    }
    on_navigate.forget();

    sync_with_location()
}
