/// Export a note as a new Notion page under the configured parent page
use serde_json::{Value, json};

use super::markdown::UNTITLED_NOTE;
use super::{api_error, string_field};
use crate::error::{Error, Result};
use crate::http::HttpMethod;
use crate::messages::ProxyRequest;
use crate::note::Note;
use crate::proxy::ProxyTransport;
use crate::settings::IntegrationSettings;

pub const NOTION_PAGES_URL: &str = "https://api.notion.com/v1/pages";
pub const NOTION_VERSION: &str = "2022-06-28";
/// Notion rejects rich text longer than this per block
pub const MAX_BLOCK_CHARS: usize = 2000;

/// Split into pieces of at most `max_chars` characters; newlines are kept
pub fn chunk_content(content: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    chars
        .chunks(max_chars.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

/// Body for `POST /v1/pages`: video embed, a "Summary" heading, then the content
pub fn page_body(note: &Note, parent_page_id: &str) -> Value {
    let title = note.title_or(UNTITLED_NOTE);

    let mut children = vec![
        json!({
            "object": "block",
            "type": "embed",
            "embed": { "url": note.video_url }
        }),
        json!({
            "object": "block",
            "type": "heading_2",
            "heading_2": { "rich_text": rich_text("Summary") }
        }),
    ];
    children.extend(
        chunk_content(note.content_or_empty(), MAX_BLOCK_CHARS)
            .iter()
            .map(|chunk| {
                json!({
                    "object": "block",
                    "type": "paragraph",
                    "paragraph": { "rich_text": rich_text(chunk) }
                })
            }),
    );

    json!({
        "parent": { "page_id": parent_page_id },
        "properties": {
            "title": { "title": rich_text(title) }
        },
        "children": children
    })
}

/// Create the page and return its URL
pub async fn export_to_notion<P: ProxyTransport>(
    note: &Note,
    settings: &IntegrationSettings,
    proxy: &P,
) -> Result<String> {
    let (Some(token), Some(page_id)) = (settings.notion_token(), settings.notion_page_id()) else {
        return Err(Error::Config("Notion integration not configured".to_string()));
    };

    let request = ProxyRequest::new(HttpMethod::Post, NOTION_PAGES_URL)
        .header("Authorization", format!("Bearer {}", token))
        .header("Notion-Version", NOTION_VERSION)
        .json_body(&page_body(note, page_id))?;

    let data = proxy
        .fetch_json(request)
        .await
        .map_err(|e| api_error("Notion", e))?;
    let url = string_field(&data, &["url"])?;
    log::info!("Exported note {} to Notion: {}", note.id, url);
    Ok(url)
}
