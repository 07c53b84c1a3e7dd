/// Hooks binding the note poller and auth state to component state
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::Services;
use crate::auth::Session;
use crate::browser;
use crate::error::{Error, Result};
use crate::note::{Note, NoteOptions};
use crate::poller::{CancelToken, PollState};
use crate::proxy;

/// How long transient notifications stay up
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct NotePollHandle {
    state: UseStateHandle<PollState>,
    error: UseStateHandle<Option<String>>,
    cancel: Rc<RefCell<CancelToken>>,
}

/// Poll state for one surface; the running loop is cancelled on unmount
#[hook]
pub fn use_note_poll() -> NotePollHandle {
    let state = use_state(|| PollState::NoNote);
    let error = use_state(|| None::<String>);
    let cancel = use_mut_ref(CancelToken::new);

    {
        let cancel = cancel.clone();
        use_effect_with((), move |_| move || cancel.borrow().cancel());
    }

    NotePollHandle { state, error, cancel }
}

impl NotePollHandle {
    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        self.error.set(Some(message.into()));
    }

    pub fn clear_error(&self) {
        self.error.set(None);
    }

    /// Cancel whatever loop is running and hand out a token for the next one
    fn fresh_token(&self) -> CancelToken {
        let token = CancelToken::new();
        self.cancel.replace(token.clone()).cancel();
        token
    }

    pub fn reset(&self) {
        self.fresh_token();
        self.error.set(None);
        self.state.set(PollState::NoNote);
    }

    fn report(&self, state: &PollState) {
        if let Some(e) = state.error() {
            self.error.set(Some(e.to_string()));
        }
    }

    /// Request a note for `video_url` and poll it to a terminal state
    pub async fn generate(&self, services: &Services, video_url: &str) -> Result<PollState> {
        self.error.set(None);
        let token = self.fresh_token();

        let options = match services.settings.load().await {
            Ok(settings) => settings.note_options(),
            Err(e) => {
                log::warn!("Failed to load settings, creating note without options: {}", e);
                NoteOptions::default()
            }
        };

        let state = self.state.clone();
        let result = services
            .poller
            .generate(
                &*services.notes,
                video_url,
                &options,
                browser::sleep,
                move |next| state.set(next.clone()),
                &token,
            )
            .await;

        match &result {
            Ok(final_state) => self.report(final_state),
            Err(e) => self.error.set(Some(e.to_string())),
        }
        result
    }

    /// Pick up a note that already exists, polling if it is still in progress
    pub async fn resume(&self, services: &Services, note: Note) -> PollState {
        let token = self.fresh_token();
        let state = self.state.clone();
        let final_state = services
            .poller
            .resume(
                &*services.notes,
                note,
                browser::sleep,
                move |next| state.set(next.clone()),
                &token,
            )
            .await;
        self.report(&final_state);
        final_state
    }

    /// Look up the note for `video_url`; a missing note is not an error
    pub async fn check_existing(&self, services: &Services, video_url: &str) -> Result<Option<PollState>> {
        match services.notes.get_note_by_url(video_url).await {
            Ok(note) => Ok(Some(self.resume(services, note).await)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The completed note, generating it first if needed
    pub async fn ensure_completed(&self, services: &Services, video_url: &str) -> Result<Note> {
        if let Some(note) = self.state.completed_note() {
            return Ok(note.clone());
        }

        let final_state = self.generate(services, video_url).await?;
        match final_state.completed_note() {
            Some(note) => Ok(note.clone()),
            None => Err(final_state
                .error()
                .unwrap_or_else(|| Error::Browser("Note generation was cancelled".to_string()))),
        }
    }
}

/// Session as seen by the background worker, for content scripts
#[hook]
pub fn use_background_session() -> UseStateHandle<Option<Option<Session>>> {
    let session = use_state(|| None::<Option<Session>>);
    {
        let session = session.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match proxy::request_auth_status().await {
                    Ok(status) => session.set(Some(status.session)),
                    Err(e) => {
                        log::warn!("Auth status request failed: {}", e);
                        session.set(Some(None));
                    }
                }
            });
            || ()
        });
    }
    session
}

/// A message that clears itself after [`NOTIFICATION_TIMEOUT`]
#[derive(Clone)]
pub struct NotificationHandle {
    message: UseStateHandle<Option<String>>,
    generation: Rc<RefCell<u64>>,
}

#[hook]
pub fn use_notification() -> NotificationHandle {
    let message = use_state(|| None::<String>);
    let generation = use_mut_ref(|| 0u64);
    NotificationHandle { message, generation }
}

impl NotificationHandle {
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn show(&self, text: impl Into<String>) {
        self.message.set(Some(text.into()));

        // Only the newest message may clear itself
        let current = {
            let mut generation = self.generation.borrow_mut();
            *generation += 1;
            *generation
        };
        let message = self.message.clone();
        let generation = self.generation.clone();
        spawn_local(async move {
            browser::sleep(NOTIFICATION_TIMEOUT).await;
            if *generation.borrow() == current {
                message.set(None);
            }
        });
    }

    pub fn dismiss(&self) {
        *self.generation.borrow_mut() += 1;
        self.message.set(None);
    }
}
