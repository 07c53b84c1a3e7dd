/// Floating note panel on watch pages
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::Services;
use super::components::{PollProgress, StatusBadge};
use super::hooks::{use_background_session, use_note_poll};
use crate::note::NoteStatus;
use crate::poller::PollState;

/// The one call to action the panel offers for a poll state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelAction {
    Generate,
    Retry,
}

fn panel_action(state: &PollState) -> Option<PanelAction> {
    match state {
        PollState::NoNote => Some(PanelAction::Generate),
        PollState::Failed(_) | PollState::TimedOut { .. } => Some(PanelAction::Retry),
        PollState::Creating | PollState::Polling { .. } | PollState::Completed(_) => None,
    }
}

#[derive(Properties, PartialEq)]
pub struct OverlayProps {
    pub video_url: String,
}

#[function_component(Overlay)]
pub fn overlay(props: &OverlayProps) -> Html {
    let services = use_context::<Services>();
    let session = use_background_session();
    let is_open = use_state(|| false);
    let checked = use_state(|| false);
    let poll = use_note_poll();

    let signed_in = matches!(&*session, Some(Some(_)));

    // Look the note up the first time the panel opens
    {
        let poll = poll.clone();
        let services = services.clone();
        let checked = checked.clone();
        let video_url = props.video_url.clone();
        let should_check = *is_open && signed_in && !*checked;
        use_effect_with(should_check, move |should_check| {
            if let (true, Some(services)) = (*should_check, services) {
                checked.set(true);
                poll.clear_error();
                spawn_local(async move {
                    if let Err(e) = poll.check_existing(&services, &video_url).await {
                        poll.set_error(e.to_string());
                    }
                });
            }
            || ()
        });
    }

    let on_dismiss = {
        let poll = poll.clone();
        Callback::from(move |_| poll.clear_error())
    };

    let on_toggle = {
        let is_open = is_open.clone();
        Callback::from(move |_| is_open.set(!*is_open))
    };

    let on_create = {
        let poll = poll.clone();
        let services = services.clone();
        let video_url = props.video_url.clone();
        Callback::from(move |_| {
            let Some(services) = services.clone() else {
                return;
            };
            let poll = poll.clone();
            let video_url = video_url.clone();
            spawn_local(async move {
                if let Err(e) = poll.generate(&services, &video_url).await {
                    log::error!("Note creation failed: {}", e);
                }
            });
        })
    };

    if !signed_in {
        return html! {};
    }

    let state = poll.state().clone();
    let max_attempts = services.as_ref().map(|s| s.poller.config().max_attempts).unwrap_or(0);

    html! {
        <div class="tubewiki-overlay">
            <button class="overlay-toggle" onclick={on_toggle} title="TubeWiki">
                {if *is_open { "✕" } else { "📖" }}
            </button>

            if *is_open {
                <div class="overlay-panel">
                    <div class="overlay-header">
                        <h2>{"TubeWiki"}</h2>
                        <StatusBadge state={state.clone()} />
                    </div>

                    <div class="overlay-body">
                        if state.is_busy() && state.note().is_none() {
                            <div class="loading-text-center">
                                <Spinner />
                            </div>
                        }

                        if let Some(err) = poll.error() {
                            <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                                {err.to_string()}
                            </Alert>
                            <Button onclick={on_dismiss} variant={ButtonVariant::Link}>
                                {"Dismiss"}
                            </Button>
                        }

                        {match panel_action(&state) {
                            Some(PanelAction::Generate) => html! {
                                <div class="loading-text-center">
                                    if poll.error().is_none() {
                                        <p class="message-text">{"No wiki found for this video."}</p>
                                    }
                                    <Button onclick={on_create.clone()} variant={ButtonVariant::Primary}>
                                        {"Generate Wiki"}
                                    </Button>
                                </div>
                            },
                            Some(PanelAction::Retry) => html! {
                                <div class="loading-text-center">
                                    <Button onclick={on_create.clone()} variant={ButtonVariant::Secondary}>
                                        {"Try Again"}
                                    </Button>
                                </div>
                            },
                            None => html! {},
                        }}

                        if let PollState::Polling { attempts, .. } = &state {
                            <PollProgress attempts={*attempts} max_attempts={max_attempts} />
                        }

                        if let Some(note) = state.note() {
                            if note.status == NoteStatus::Processing {
                                <p class="message-text">{"Generating content..."}</p>
                            }
                            if let Some(title) = &note.title {
                                <h3 class="note-title">{title}</h3>
                            }
                            if let Some(content) = &note.content {
                                <div class="note-content">{content}</div>
                            }
                        }
                    </div>
                </div>
            }
        </div>
    }
}
