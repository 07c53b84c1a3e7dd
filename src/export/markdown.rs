/// Markdown rendering and file naming shared by the exporters
use regex::Regex;

use crate::note::Note;

/// Title used by the integration exporters when the note has none
pub const UNTITLED_NOTE: &str = "Untitled Note";
/// Title used by the clipboard and download exporters when the note has none
pub const UNTITLED: &str = "Untitled";

/// Full document with a source line: Notion paste, GitHub and Obsidian
pub fn note_markdown(note: &Note) -> String {
    format!(
        "# {}\n\nURL: {}\n\n{}",
        note.title_or(UNTITLED_NOTE),
        note.video_url,
        note.content_or_empty()
    )
}

/// Bare title and body: clipboard and download
pub fn clipboard_markdown(note: &Note) -> String {
    format!("# {}\n\n{}", note.title_or(UNTITLED), note.content_or_empty())
}

/// Drop characters no filesystem accepts and trim the ends
pub fn sanitize_filename(name: &str) -> String {
    let invalid = match Regex::new(r#"[<>:"/\\|?*]"#) {
        Ok(re) => re,
        Err(e) => {
            log::warn!("Failed to compile filename regex: {}", e);
            return name.trim().to_string();
        }
    };
    invalid.replace_all(name, "").trim().to_string()
}

/// `<slug>.md` where every non-alphanumeric ASCII char becomes `-`
pub fn download_filename(note: &Note) -> String {
    let slug: String = note
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or("untitled")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    format!("{}.md", slug)
}
