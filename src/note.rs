/// Data structures for notes served by the TubeWiki backend
use serde::{Deserialize, Serialize};

/// Lifecycle of a note on the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl NoteStatus {
    /// COMPLETED and FAILED end polling
    pub fn is_terminal(self) -> bool {
        matches!(self, NoteStatus::Completed | NoteStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteStatus::Pending => "PENDING",
            NoteStatus::Processing => "PROCESSING",
            NoteStatus::Completed => "COMPLETED",
            NoteStatus::Failed => "FAILED",
        }
    }
}

/// A generated study note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: i64,
    pub user_id: String,
    pub video_url: String,
    pub status: NoteStatus,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub notion_url: Option<String>,
}

impl Note {
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(fallback)
    }

    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Leading slice of the content for previews, cut on a char boundary
    pub fn preview(&self, max_chars: usize) -> String {
        let content = self.content_or_empty();
        match content.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &content[..idx]),
            None => content.to_string(),
        }
    }
}

/// Options forwarded to the backend when a note is requested
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NoteOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_page_id: Option<String>,
}

/// Body of `POST /notes`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateNoteRequest<'a> {
    pub video_url: &'a str,
    pub options: &'a NoteOptions,
}

/// Reply to `POST /notes`: the job was accepted, the note may still be pending
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedNote {
    pub note_id: i64,
    pub status: NoteStatus,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_note(id: i64, status: NoteStatus) -> Note {
    Note {
        id,
        user_id: "user-1".to_string(),
        video_url: "https://www.youtube.com/watch?v=abc".to_string(),
        status,
        title: Some("Rust Ownership".to_string()),
        content: if status == NoteStatus::Completed {
            Some("Borrowing rules.".to_string())
        } else {
            None
        },
        error_message: if status == NoteStatus::Failed {
            Some("Transcript unavailable".to_string())
        } else {
            None
        },
        created_at: "2024-10-28T10:30:00".to_string(),
        updated_at: None,
        notion_url: None,
    }
}
