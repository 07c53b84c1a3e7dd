/// Popup UI for TubeWiki

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::Services;
use super::components::{NotePreview, PollProgress, StatusBadge};
use super::hooks::use_note_poll;
use super::login::Login;
use super::settings::SettingsPanel;
use crate::auth::Session;
use crate::browser;
use crate::poller::PollState;
use crate::proxy;
use crate::youtube;

#[derive(Clone, Copy, PartialEq)]
enum ActiveTab {
    Home,
    Settings,
}

/// Root of the popup: builds the services and provides them to every child
#[function_component(App)]
pub fn app() -> Html {
    let services = use_memo((), |_| Services::from_build_env(true));

    match &*services {
        Ok(services) => html! {
            <ContextProvider<Services> context={services.clone()}>
                <Popup />
            </ContextProvider<Services>>
        },
        Err(e) => html! {
            <div class="padding-20">
                <Alert r#type={AlertType::Danger} title={"Configuration error"} inline={true}>
                    {e.to_string()}
                </Alert>
            </div>
        },
    }
}

/// Let the background worker refresh its badge after a sign-in change
fn refresh_badge() {
    spawn_local(async {
        if let Err(e) = proxy::request_auth_status().await {
            log::debug!("Badge refresh skipped: {}", e);
        }
    });
}

#[function_component(Popup)]
fn popup() -> Html {
    let services = use_context::<Services>();
    let session = use_state(|| None::<Session>);
    let loading = use_state(|| true);
    let current_url = use_state(|| None::<String>);
    let active_tab = use_state(|| ActiveTab::Home);
    let poll = use_note_poll();

    // Track auth changes for the popup's lifetime
    {
        let session = session.clone();
        let loading = loading.clone();
        let auth = services.as_ref().and_then(|s| s.auth.clone());
        use_effect_with((), move |_| {
            let subscription = auth.as_ref().map(|auth| {
                let session = session.clone();
                auth.on_auth_state_change(move |event, current| {
                    log::info!("Auth state changed: {:?}", event);
                    session.set(current.cloned());
                    refresh_badge();
                })
            });

            if let Some(auth) = auth.clone() {
                spawn_local(async move {
                    match auth.get_session().await {
                        Ok(current) => session.set(current),
                        Err(e) => log::error!("Failed to read session: {}", e),
                    }
                    loading.set(false);
                });
            } else {
                loading.set(false);
            }

            move || {
                if let Some(subscription) = subscription {
                    subscription.unsubscribe();
                }
                if let Some(auth) = auth {
                    auth.shutdown();
                }
            }
        });
    }

    // Once signed in: find the active video and any existing note for it
    {
        let current_url = current_url.clone();
        let poll = poll.clone();
        let services = services.clone();
        let signed_in = session.is_some();
        use_effect_with(signed_in, move |signed_in| {
            if *signed_in {
                if let Some(services) = services {
                    spawn_local(async move {
                        let url = match browser::active_tab_url().await {
                            Ok(url) => url,
                            Err(e) => {
                                log::error!("Failed to read active tab: {}", e);
                                None
                            }
                        };
                        let video_url = url.as_deref().and_then(youtube::canonicalize);
                        current_url.set(url);
                        if let Some(video_url) = video_url {
                            // No note yet is the common case; failures only matter once the user acts
                            if let Err(e) = poll.check_existing(&services, &video_url).await {
                                log::warn!("Existing note lookup failed: {}", e);
                            }
                        }
                    });
                }
            }
            || ()
        });
    }

    let on_generate = {
        let poll = poll.clone();
        let services = services.clone();
        let video_url = current_url.as_deref().and_then(youtube::canonicalize);

        Callback::from(move |_| {
            let (Some(services), Some(video_url)) = (services.clone(), video_url.clone()) else {
                return;
            };
            let poll = poll.clone();
            spawn_local(async move {
                if let Err(e) = poll.generate(&services, &video_url).await {
                    log::error!("Note creation failed: {}", e);
                }
            });
        })
    };

    let on_dismiss_error = {
        let poll = poll.clone();
        Callback::from(move |_| poll.clear_error())
    };

    let on_reset = {
        let poll = poll.clone();
        Callback::from(move |_| poll.reset())
    };

    let on_toggle_settings = {
        let active_tab = active_tab.clone();
        Callback::from(move |_| {
            active_tab.set(match *active_tab {
                ActiveTab::Home => ActiveTab::Settings,
                ActiveTab::Settings => ActiveTab::Home,
            });
        })
    };

    let on_sign_out = {
        let auth = services.as_ref().and_then(|s| s.auth.clone());
        Callback::from(move |_| {
            if let Some(auth) = auth.clone() {
                spawn_local(async move {
                    if let Err(e) = auth.sign_out().await {
                        log::error!("Sign out failed: {}", e);
                    }
                });
            }
        })
    };

    let on_open_notion = {
        let notion_url = poll.state().note().and_then(|note| note.notion_url.clone());
        Callback::from(move |_| {
            if let Some(url) = notion_url.clone() {
                spawn_local(async move {
                    if let Err(e) = browser::open_tab(&url).await {
                        log::error!("Failed to open Notion page: {}", e);
                    }
                });
            }
        })
    };

    if *loading {
        return html! {
            <div class="loading-text-center">
                <Spinner />
                <p class="loading-text">{"Loading..."}</p>
            </div>
        };
    }

    if session.is_none() {
        return html! { <Login onlogin={Callback::from(|_| ())} /> };
    }

    let state = poll.state().clone();
    let is_busy = state.is_busy();
    let is_video = current_url.as_deref().and_then(youtube::canonicalize).is_some();
    let max_attempts = services.as_ref().map(|s| s.poller.config().max_attempts).unwrap_or(0);

    html! {
        <div class="padding-20">
            <div class="popup-header">
                <h1 class="popup-title">{"▶ TubeWiki"}</h1>
                <div class="header-actions">
                    <Button onclick={on_toggle_settings} variant={ButtonVariant::Plain}>
                        {"⚙️"}
                    </Button>
                    <Button onclick={on_sign_out} variant={ButtonVariant::Plain}>
                        {"🚪"}
                    </Button>
                </div>
            </div>

            {match *active_tab {
                ActiveTab::Settings => html! { <SettingsPanel /> },
                ActiveTab::Home => html! {
                    <div class="flex-column-gap">
                        if let Some(err) = poll.error() {
                            <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                                {err.to_string()}
                            </Alert>
                            <Button onclick={on_dismiss_error} variant={ButtonVariant::Link}>
                                {"Dismiss"}
                            </Button>
                        }

                        if state.note().is_none() && !is_busy {
                            <div class="stats-box">
                                <h3 class="stats-title">{"Current Video"}</h3>
                                <p class="message-text">{current_url.as_deref().unwrap_or("No active tab")}</p>
                            </div>
                            <Button onclick={on_generate} disabled={!is_video} variant={ButtonVariant::Primary} block={true}>
                                {"Generate Note"}
                            </Button>
                            if !is_video {
                                <p class="message-text">{"Open a YouTube video to generate a note."}</p>
                            }
                        }

                        if is_busy {
                            <div class="loading-text-center">
                                <Spinner />
                                <p class="loading-text">{"Generating note..."}</p>
                            </div>
                        }

                        <StatusBadge state={state.clone()} />

                        if let PollState::Polling { attempts, .. } = &state {
                            <PollProgress attempts={*attempts} max_attempts={max_attempts} />
                        }

                        if let Some(note) = state.note() {
                            <NotePreview note={note.clone()} />
                            if note.notion_url.is_some() {
                                <Button onclick={on_open_notion} variant={ButtonVariant::Secondary} block={true}>
                                    {"Open in Notion"}
                                </Button>
                            }
                        }

                        if state.is_terminal() {
                            <Button onclick={on_reset} variant={ButtonVariant::Link} block={true}>
                                {"New Note"}
                            </Button>
                        }
                    </div>
                },
            }}

            <p class="footer-popup">
                {"TubeWiki v0.1.0"}
            </p>
        </div>
    }
}
