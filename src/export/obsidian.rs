/// Build `obsidian://new` URIs; the vault name is optional
use super::markdown::{UNTITLED_NOTE, note_markdown, sanitize_filename};
use crate::note::Note;

pub fn obsidian_uri(note: &Note, vault_name: Option<&str>) -> String {
    let name = sanitize_filename(note.title_or(UNTITLED_NOTE));
    let mut uri = format!(
        "obsidian://new?name={}&content={}",
        urlencoding::encode(&name),
        urlencoding::encode(&note_markdown(note))
    );
    if let Some(vault) = vault_name.filter(|v| !v.is_empty()) {
        uri.push_str("&vault=");
        uri.push_str(&urlencoding::encode(vault));
    }
    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{NoteStatus, sample_note};

    #[test]
    fn test_uri_without_vault() {
        let note = sample_note(1, NoteStatus::Completed);

        let uri = obsidian_uri(&note, None);

        assert!(uri.starts_with("obsidian://new?name=Rust%20Ownership&content=%23%20Rust%20Ownership%0A%0AURL%3A%20"));
        assert!(uri.ends_with("Borrowing%20rules."));
        assert!(!uri.contains("&vault="));
    }

    #[test]
    fn test_uri_with_vault() {
        let note = sample_note(1, NoteStatus::Completed);

        let uri = obsidian_uri(&note, Some("My Vault"));

        assert!(uri.ends_with("&vault=My%20Vault"));
        assert_eq!(obsidian_uri(&note, Some("")), obsidian_uri(&note, None));
    }

    #[test]
    fn test_name_is_sanitized() {
        let mut note = sample_note(1, NoteStatus::Completed);
        note.title = Some("C++: a/b?".to_string());

        let uri = obsidian_uri(&note, None);

        assert!(uri.starts_with("obsidian://new?name=C%2B%2B%20ab&content="));
    }
}
