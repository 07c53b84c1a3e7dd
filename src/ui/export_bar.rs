/// Export bar injected under YouTube videos
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::Services;
use super::components::Notification;
use super::hooks::{NotePollHandle, NotificationHandle, use_note_poll, use_notification};
use crate::export::{ExportContext, ExportTarget, export_note};

#[derive(Properties, PartialEq)]
pub struct ExportBarProps {
    /// Canonical watch URL of the page the bar is mounted on
    pub video_url: String,
}

async fn run_export(
    target: ExportTarget,
    services: Services,
    video_url: String,
    poll: NotePollHandle,
    notification: NotificationHandle,
) {
    let settings = match services.settings.load().await {
        Ok(settings) => settings,
        Err(e) => {
            notification.show(format!("❌ Error: {}", e));
            return;
        }
    };
    if let Some(warning) = target.missing_config(&settings) {
        notification.show(warning);
        return;
    }

    let note = match poll.ensure_completed(&services, &video_url).await {
        Ok(note) => note,
        Err(e) => {
            log::error!("No note to export: {}", e);
            notification.show(format!("❌ Error: {}", e));
            return;
        }
    };

    if let Some(progress) = target.progress_message() {
        notification.show(progress);
    }

    let ctx = ExportContext {
        settings: &settings,
        proxy: services.notes.proxy(),
        pending: &*services.pending,
    };
    match export_note(target, &note, &ctx).await {
        Ok(message) => notification.show(message),
        Err(e) => {
            log::error!("Export via {:?} failed: {}", target, e);
            notification.show(format!("❌ Error: {}", e));
        }
    }
}

#[function_component(ExportBar)]
pub fn export_bar(props: &ExportBarProps) -> Html {
    let services = use_context::<Services>();
    let poll = use_note_poll();
    let notification = use_notification();

    // Pick up an existing note for this video
    {
        let poll = poll.clone();
        let services = services.clone();
        use_effect_with(props.video_url.clone(), move |video_url| {
            let video_url = video_url.clone();
            if let Some(services) = services {
                spawn_local(async move {
                    if let Err(e) = poll.check_existing(&services, &video_url).await {
                        log::warn!("Existing note lookup failed: {}", e);
                    }
                });
            }
            || ()
        });
    }

    let on_export = {
        let poll = poll.clone();
        let notification = notification.clone();
        let services = services.clone();
        let video_url = props.video_url.clone();
        move |target: ExportTarget| {
            let poll = poll.clone();
            let notification = notification.clone();
            let services = services.clone();
            let video_url = video_url.clone();
            Callback::from(move |_: MouseEvent| {
                let Some(services) = services.clone() else {
                    return;
                };
                spawn_local(run_export(
                    target,
                    services,
                    video_url.clone(),
                    poll.clone(),
                    notification.clone(),
                ));
            })
        }
    };

    let on_dismiss = {
        let notification = notification.clone();
        Callback::from(move |_| notification.dismiss())
    };

    let loading = poll.state().is_busy();

    html! {
        <div class="tubewiki-export-bar">
            <div class="logo">
                <span class="logo-mark">{"◆"}</span>
                <span>{"TubeWiki"}</span>
            </div>

            <div class="export-buttons">
                {for ExportTarget::ALL.iter().map(|target| html! {
                    <button
                        title={target.label()}
                        disabled={loading}
                        onclick={on_export(*target)}
                    >
                        {target.icon()}
                    </button>
                })}
            </div>

            if loading {
                <div class="loading-spinner">
                    <Spinner />
                    <span>{"Generating summary..."}</span>
                </div>
            }

            if let Some(message) = notification.message() {
                <Notification message={message.to_string()} ondismiss={on_dismiss} />
            }
        </div>
    }
}
