/// Reusable UI components

use yew::prelude::*;

use crate::note::Note;
use crate::poller::PollState;

/// Characters of content shown before "..."
pub const PREVIEW_CHARS: usize = 300;

#[derive(Properties, PartialEq)]
pub struct StatusBadgeProps {
    pub state: PollState,
}

#[function_component(StatusBadge)]
pub fn status_badge(props: &StatusBadgeProps) -> Html {
    let Some(label) = props.state.status_label() else {
        return html! {};
    };

    let (bg_color, text_color) = match &props.state {
        PollState::Completed(_) => ("#e8f5e9", "#2e7d32"),
        PollState::Failed(_) | PollState::TimedOut { .. } => ("#ffebee", "#c62828"),
        _ => ("#fff8e1", "#f57f17"),
    };

    html! {
        <span style={format!("padding: 2px 8px; border-radius: 9999px; font-size: 12px; background-color: {}; color: {};", bg_color, text_color)}>
            {label}
        </span>
    }
}

#[derive(Properties, PartialEq)]
pub struct PollProgressProps {
    pub attempts: u32,
    pub max_attempts: u32,
}

/// How much of the polling budget has been used
#[function_component(PollProgress)]
pub fn poll_progress(props: &PollProgressProps) -> Html {
    let percent = if props.max_attempts == 0 {
        100
    } else {
        (props.attempts.min(props.max_attempts) * 100 / props.max_attempts).min(100)
    };

    html! {
        <div class="progress-container">
            <div style={format!("width: {}%; background-color: #065fd4; height: 100%; transition: width 0.3s ease;", percent)}>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct NotePreviewProps {
    pub note: Note,
    #[prop_or(PREVIEW_CHARS)]
    pub max_chars: usize,
}

#[function_component(NotePreview)]
pub fn note_preview(props: &NotePreviewProps) -> Html {
    let note = &props.note;

    html! {
        <div class="note-preview">
            if let Some(title) = &note.title {
                <h3 class="note-title">{title}</h3>
            }
            if note.content.is_some() {
                <p class="note-content">{note.preview(props.max_chars)}</p>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct NotificationProps {
    pub message: String,
    pub ondismiss: Callback<MouseEvent>,
}

#[function_component(Notification)]
pub fn notification(props: &NotificationProps) -> Html {
    html! {
        <div class="notification">
            <span>{&props.message}</span>
            <button class="notification-close" title="Dismiss" onclick={props.ondismiss.clone()}>
                {"×"}
            </button>
        </div>
    }
}
