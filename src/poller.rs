/// Note polling state machine shared by every UI surface
///
/// NoNote → Creating → Polling → {Completed, Failed, TimedOut}
///
/// [`PollState::apply`] is the pure transition function; [`Poller`] drives it
/// with a fetch callback, a sleep callback and a change callback so the same
/// loop runs under Yew and in plain unit tests.
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use crate::api::NoteClient;
use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::note::{Note, NoteOptions, NoteStatus};
use crate::proxy::ProxyTransport;

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    NoNote,
    Creating,
    Polling {
        note_id: i64,
        attempts: u32,
        latest: Option<Note>,
    },
    Completed(Note),
    Failed(Note),
    TimedOut {
        note_id: i64,
        attempts: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    CreateRequested,
    Created(i64),
    CreateFailed,
    /// An existing note turned up (e.g. the by-URL check on page load)
    Found(Note),
    Fetched(Result<Note>),
    Reset,
}

impl PollState {
    pub fn apply(self, event: PollEvent, config: &PollConfig) -> PollState {
        match (self, event) {
            (_, PollEvent::Reset) => PollState::NoNote,

            (PollState::NoNote, PollEvent::CreateRequested) => PollState::Creating,
            (PollState::Creating, PollEvent::Created(note_id)) => PollState::Polling {
                note_id,
                attempts: 0,
                latest: None,
            },
            (PollState::Creating, PollEvent::CreateFailed) => PollState::NoNote,

            (PollState::NoNote | PollState::Creating, PollEvent::Found(note)) => {
                if note.status.is_terminal() {
                    PollState::settled(note)
                } else {
                    PollState::Polling {
                        note_id: note.id,
                        attempts: 0,
                        latest: Some(note),
                    }
                }
            }

            (PollState::Polling { note_id, attempts, latest }, PollEvent::Fetched(result)) => {
                let latest = match result {
                    Ok(note) if note.status.is_terminal() => return PollState::settled(note),
                    Ok(note) => Some(note),
                    Err(e) => {
                        log::warn!("Polling note {} failed, retrying: {}", note_id, e);
                        latest
                    }
                };

                let attempts = attempts + 1;
                if attempts >= config.max_attempts {
                    log::warn!("Note {} still not ready after {} attempts", note_id, attempts);
                    PollState::TimedOut { note_id, attempts }
                } else {
                    PollState::Polling {
                        note_id,
                        attempts,
                        latest,
                    }
                }
            }

            (state, event) => {
                log::debug!("Ignoring {:?} in {:?}", event, state);
                state
            }
        }
    }

    fn settled(note: Note) -> PollState {
        match note.status {
            NoteStatus::Failed => PollState::Failed(note),
            _ => PollState::Completed(note),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, PollState::Creating | PollState::Polling { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Completed(_) | PollState::Failed(_) | PollState::TimedOut { .. }
        )
    }

    /// Most recent view of the note, if any
    pub fn note(&self) -> Option<&Note> {
        match self {
            PollState::Completed(note) | PollState::Failed(note) => Some(note),
            PollState::Polling { latest, .. } => latest.as_ref(),
            _ => None,
        }
    }

    pub fn completed_note(&self) -> Option<&Note> {
        match self {
            PollState::Completed(note) => Some(note),
            _ => None,
        }
    }

    /// User-facing error for the failure end states
    pub fn error(&self) -> Option<Error> {
        match self {
            PollState::Failed(note) => Some(Error::NoteFailed(
                note.error_message
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            )),
            PollState::TimedOut { .. } => Some(Error::Timeout),
            _ => None,
        }
    }

    pub fn status_label(&self) -> Option<&'static str> {
        match self {
            PollState::NoNote => None,
            PollState::Creating => Some(NoteStatus::Pending.as_str()),
            PollState::Polling { latest, .. } => Some(
                latest
                    .as_ref()
                    .map(|note| note.status.as_str())
                    .unwrap_or(NoteStatus::Pending.as_str()),
            ),
            PollState::Completed(_) => Some(NoteStatus::Completed.as_str()),
            PollState::Failed(_) => Some(NoteStatus::Failed.as_str()),
            PollState::TimedOut { .. } => Some("TIMED OUT"),
        }
    }
}

/// Shared flag a UI surface flips on unmount to stop its loop
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Poller {
    config: PollConfig,
}

impl Poller {
    pub fn new(config: PollConfig) -> Self {
        Poller { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Keep fetching while in `Polling`; returns the state the loop stopped in
    pub async fn run<F, FFut, Z, ZFut, C>(
        &self,
        mut state: PollState,
        fetch: F,
        sleep: Z,
        mut on_change: C,
        cancel: &CancelToken,
    ) -> PollState
    where
        F: Fn(i64) -> FFut,
        FFut: Future<Output = Result<Note>>,
        Z: Fn(Duration) -> ZFut,
        ZFut: Future<Output = ()>,
        C: FnMut(&PollState),
    {
        while let PollState::Polling { note_id, .. } = &state {
            let note_id = *note_id;

            sleep(self.config.interval).await;
            if cancel.is_cancelled() {
                log::debug!("Polling for note {} cancelled", note_id);
                return state;
            }

            let result = fetch(note_id).await;
            if cancel.is_cancelled() {
                return state;
            }

            state = state.apply(PollEvent::Fetched(result), &self.config);
            on_change(&state);
        }
        state
    }

    /// Request a note for `video_url`, then poll it to a terminal state
    pub async fn generate<P, Z, ZFut, C>(
        &self,
        client: &NoteClient<P>,
        video_url: &str,
        options: &NoteOptions,
        sleep: Z,
        mut on_change: C,
        cancel: &CancelToken,
    ) -> Result<PollState>
    where
        P: ProxyTransport,
        Z: Fn(Duration) -> ZFut,
        ZFut: Future<Output = ()>,
        C: FnMut(&PollState),
    {
        let state = PollState::NoNote.apply(PollEvent::CreateRequested, &self.config);
        on_change(&state);

        let state = match client.create_note(video_url, options).await {
            Ok(created) => state.apply(PollEvent::Created(created.note_id), &self.config),
            Err(e) => {
                let state = state.apply(PollEvent::CreateFailed, &self.config);
                on_change(&state);
                return Err(e);
            }
        };
        on_change(&state);

        Ok(self
            .run(state, |id| client.get_note(id), sleep, on_change, cancel)
            .await)
    }

    /// Continue from a note that already exists
    pub async fn resume<P, Z, ZFut, C>(
        &self,
        client: &NoteClient<P>,
        note: Note,
        sleep: Z,
        mut on_change: C,
        cancel: &CancelToken,
    ) -> PollState
    where
        P: ProxyTransport,
        Z: Fn(Duration) -> ZFut,
        ZFut: Future<Output = ()>,
        C: FnMut(&PollState),
    {
        let state = PollState::NoNote.apply(PollEvent::Found(note), &self.config);
        on_change(&state);
        self.run(state, |id| client.get_note(id), sleep, on_change, cancel)
            .await
    }
}
