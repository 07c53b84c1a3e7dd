/// Commit a note as a markdown file through the GitHub contents API
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use super::markdown::{UNTITLED_NOTE, note_markdown, sanitize_filename};
use super::{api_error, string_field};
use crate::error::{Error, Result};
use crate::http::HttpMethod;
use crate::messages::ProxyRequest;
use crate::note::Note;
use crate::proxy::ProxyTransport;
use crate::settings::IntegrationSettings;

pub const GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: String,
    content: &'a str,
}

/// `YYYY-MM-DD-<title>.md` with whitespace runs collapsed to `-`
pub fn github_filename(title: &str, date: &str) -> String {
    let sanitized = sanitize_filename(title);
    let safe: Vec<&str> = sanitized.split_whitespace().collect();
    format!("{}-{}.md", date, safe.join("-"))
}

/// `repo` is `owner/name` and goes in as-is; the filename is percent-encoded
pub fn contents_url(repo: &str, filename: &str) -> String {
    format!(
        "{}/repos/{}/contents/{}",
        GITHUB_API_URL,
        repo,
        urlencoding::encode(filename)
    )
}

/// Create the file and return its `html_url`; `date` is the commit day as `YYYY-MM-DD`
pub async fn export_to_github<P: ProxyTransport>(
    note: &Note,
    settings: &IntegrationSettings,
    date: &str,
    proxy: &P,
) -> Result<String> {
    let (Some(token), Some(repo)) = (settings.github_token(), settings.github_repo()) else {
        return Err(Error::Config("GitHub integration not configured".to_string()));
    };

    let title = note.title_or(UNTITLED_NOTE);
    let encoded = STANDARD.encode(note_markdown(note).as_bytes());
    let body = PutContents {
        message: format!("Add note: {}", title),
        content: &encoded,
    };

    let request = ProxyRequest::new(HttpMethod::Put, contents_url(repo, &github_filename(title, date)))
        .header("Authorization", format!("Bearer {}", token))
        .header("Accept", "application/vnd.github.v3+json")
        .json_body(&body)?;

    let data = proxy
        .fetch_json(request)
        .await
        .map_err(|e| api_error("GitHub", e))?;
    let url = string_field(&data, &["content", "html_url"])?;
    log::info!("Exported note {} to GitHub: {}", note.id, url);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{NoteStatus, sample_note};
    use crate::testing::FakeProxy;
    use futures::executor::block_on;
    use serde_json::json;

    fn configured() -> IntegrationSettings {
        IntegrationSettings {
            github_token: Some("ghp_token".to_string()),
            github_repo: Some("octo/notes".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_github_filename() {
        assert_eq!(
            github_filename("Rust Ownership", "2024-10-28"),
            "2024-10-28-Rust-Ownership.md"
        );
        assert_eq!(
            github_filename(" What is  a/b? ", "2024-10-28"),
            "2024-10-28-What-is-ab.md"
        );
    }

    #[test]
    fn test_contents_url_encodes_filename() {
        let filename = github_filename("C# Basics 100%", "2024-10-28");
        assert_eq!(filename, "2024-10-28-C#-Basics-100%.md");

        let url = contents_url("octo/notes", &filename);
        assert_eq!(
            url,
            "https://api.github.com/repos/octo/notes/contents/2024-10-28-C%23-Basics-100%25.md"
        );

        let parsed = url::Url::parse(&url).unwrap();
        assert_eq!(parsed.fragment(), None);
        assert!(parsed.path().ends_with("/contents/2024-10-28-C%23-Basics-100%25.md"));
    }

    #[test]
    fn test_export_to_title_with_reserved_characters() {
        let proxy = FakeProxy::new();
        proxy.push_ok(201, json!({"content": {"html_url": "https://github.com/x"}}));
        let mut note = sample_note(1, NoteStatus::Completed);
        note.title = Some("Q&A + Tips".to_string());

        block_on(export_to_github(&note, &configured(), "2024-10-28", &proxy)).unwrap();

        assert_eq!(
            proxy.requests()[0].url,
            "https://api.github.com/repos/octo/notes/contents/2024-10-28-Q%26A-%2B-Tips.md"
        );
    }

    #[test]
    fn test_missing_config_fails_before_network() {
        let proxy = FakeProxy::new();
        let settings = IntegrationSettings {
            github_token: Some("ghp_token".to_string()),
            ..Default::default()
        };

        let err = block_on(export_to_github(
            &sample_note(1, NoteStatus::Completed),
            &settings,
            "2024-10-28",
            &proxy,
        ))
        .unwrap_err();

        assert_eq!(err.to_string(), "GitHub integration not configured");
        assert_eq!(proxy.request_count(), 0);
    }

    #[test]
    fn test_export_puts_base64_content() {
        let proxy = FakeProxy::new();
        proxy.push_ok(
            201,
            json!({"content": {"html_url": "https://github.com/octo/notes/blob/main/x.md"}}),
        );
        let note = sample_note(1, NoteStatus::Completed);

        let url = block_on(export_to_github(&note, &configured(), "2024-10-28", &proxy)).unwrap();

        assert_eq!(url, "https://github.com/octo/notes/blob/main/x.md");
        let request = &proxy.requests()[0];
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(
            request.url,
            "https://api.github.com/repos/octo/notes/contents/2024-10-28-Rust-Ownership.md"
        );
        assert_eq!(request.headers["Authorization"], "Bearer ghp_token");
        assert_eq!(request.headers["Accept"], "application/vnd.github.v3+json");

        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["message"], "Add note: Rust Ownership");
        let decoded = STANDARD.decode(body["content"].as_str().unwrap()).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), note_markdown(&note));
    }

    #[test]
    fn test_non_ascii_content_is_utf8_encoded() {
        let proxy = FakeProxy::new();
        proxy.push_ok(201, json!({"content": {"html_url": "https://github.com/x"}}));
        let mut note = sample_note(1, NoteStatus::Completed);
        note.content = Some("所有権と借用".to_string());

        block_on(export_to_github(&note, &configured(), "2024-10-28", &proxy)).unwrap();

        let body: serde_json::Value =
            serde_json::from_str(proxy.requests()[0].body.as_deref().unwrap()).unwrap();
        let decoded = STANDARD.decode(body["content"].as_str().unwrap()).unwrap();
        assert!(String::from_utf8(decoded).unwrap().ends_with("所有権と借用"));
    }

    #[test]
    fn test_missing_html_url_is_decode_error() {
        let proxy = FakeProxy::new();
        proxy.push_ok(201, json!({"commit": {}}));

        let err = block_on(export_to_github(
            &sample_note(1, NoteStatus::Completed),
            &configured(),
            "2024-10-28",
            &proxy,
        ))
        .unwrap_err();

        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_api_error_is_prefixed() {
        let proxy = FakeProxy::new();
        proxy.push_status(422, "Invalid request.\n\n\"sha\" wasn't supplied.");

        let err = block_on(export_to_github(
            &sample_note(1, NoteStatus::Completed),
            &configured(),
            "2024-10-28",
            &proxy,
        ))
        .unwrap_err();

        assert!(err.to_string().starts_with("GitHub API Error: Invalid request."));
    }
}
