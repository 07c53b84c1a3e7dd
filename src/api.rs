/// REST client for the note-generation backend, spoken through the proxy bridge
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::http::HttpMethod;
use crate::messages::ProxyRequest;
use crate::note::{CreateNoteRequest, CreatedNote, Note, NoteOptions};
use crate::proxy::ProxyTransport;

pub struct NoteClient<P> {
    base_url: String,
    proxy: P,
}

impl<P: ProxyTransport> NoteClient<P> {
    pub fn new(base_url: &str, proxy: P) -> Self {
        NoteClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            proxy,
        }
    }

    pub fn proxy(&self) -> &P {
        &self.proxy
    }

    /// Ask the backend to generate a note; the reply may still be PENDING
    pub async fn create_note(&self, video_url: &str, options: &NoteOptions) -> Result<CreatedNote> {
        let request = ProxyRequest::new(HttpMethod::Post, format!("{}/notes", self.base_url))
            .json_body(&CreateNoteRequest { video_url, options })?;

        let data = self
            .proxy
            .relay(request)
            .await
            .into_result()
            .map_err(|e| or_default(e, "Failed to create note"))?;
        let created: CreatedNote = decode(data)?;
        log::info!("Note {} accepted ({})", created.note_id, created.status.as_str());
        Ok(created)
    }

    pub async fn get_note(&self, note_id: i64) -> Result<Note> {
        let request = ProxyRequest::get(format!("{}/notes/{}", self.base_url, note_id));
        let response = self.proxy.relay(request).await;
        decode(response.into_result()?)
    }

    /// A 404 means "no note for this video yet" and surfaces as [`Error::NotFound`]
    pub async fn get_note_by_url(&self, video_url: &str) -> Result<Note> {
        let request = ProxyRequest::get(format!(
            "{}/notes/by-url/?video_url={}",
            self.base_url,
            urlencoding::encode(video_url)
        ));
        let response = self.proxy.relay(request).await;
        if response.status == 404 {
            return Err(Error::NotFound);
        }
        decode(response.into_result()?)
    }
}

fn decode<T: DeserializeOwned>(data: serde_json::Value) -> Result<T> {
    serde_json::from_value(data).map_err(Error::from)
}

/// Plain "HTTP <status>" messages are replaced by a friendlier default
fn or_default(err: Error, default: &str) -> Error {
    match err {
        Error::Http { status, message } if message == format!("HTTP {}", status) => Error::Http {
            status,
            message: default.to_string(),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteStatus;
    use crate::testing::FakeProxy;
    use futures::executor::block_on;
    use serde_json::json;

    const BASE: &str = "http://localhost:8000/api/v1";

    fn note_json(status: &str) -> serde_json::Value {
        json!({
            "id": 1,
            "user_id": "user-1",
            "video_url": "https://www.youtube.com/watch?v=abc",
            "status": status,
            "title": "Test Note",
            "content": "Body",
            "error_message": null,
            "created_at": "2024-10-28T10:30:00",
            "updated_at": null
        })
    }

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let proxy = FakeProxy::new();
        proxy.push_ok(200, note_json("COMPLETED"));
        let client = NoteClient::new("http://localhost:8000/api/v1/", proxy);

        block_on(client.get_note(1)).unwrap();

        assert_eq!(client.proxy().requests()[0].url, "http://localhost:8000/api/v1/notes/1");
    }

    #[test]
    fn test_create_note_sends_post() {
        let proxy = FakeProxy::new();
        proxy.push_ok(202, json!({"message": "Job accepted", "note_id": 5, "status": "PENDING"}));
        let client = NoteClient::new(BASE, proxy);
        let options = NoteOptions {
            notion_token: Some("secret".to_string()),
            notion_page_id: None,
        };

        let created = block_on(client.create_note("https://www.youtube.com/watch?v=test", &options)).unwrap();

        assert_eq!(created.note_id, 5);
        assert_eq!(created.status, NoteStatus::Pending);

        let request = &client.proxy().requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "http://localhost:8000/api/v1/notes");
        assert_eq!(request.headers["Content-Type"], "application/json");
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"video_url": "https://www.youtube.com/watch?v=test", "options": {"notion_token": "secret"}})
        );
    }

    #[test]
    fn test_create_note_rejects_on_error_response() {
        let proxy = FakeProxy::new();
        proxy.push_status(500, "Internal server error");
        let client = NoteClient::new(BASE, proxy);

        let err = block_on(client.create_note("https://www.youtube.com/watch?v=test", &NoteOptions::default())).unwrap_err();

        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_create_note_default_message() {
        let proxy = FakeProxy::new();
        proxy.push_status(500, "HTTP 500");
        let client = NoteClient::new(BASE, proxy);

        let err = block_on(client.create_note("https://www.youtube.com/watch?v=test", &NoteOptions::default())).unwrap_err();

        assert_eq!(err.to_string(), "Failed to create note");
    }

    #[test]
    fn test_get_note() {
        let proxy = FakeProxy::new();
        proxy.push_ok(200, note_json("PROCESSING"));
        let client = NoteClient::new(BASE, proxy);

        let note = block_on(client.get_note(1)).unwrap();

        assert_eq!(note.status, NoteStatus::Processing);
        assert_eq!(client.proxy().requests()[0].method, HttpMethod::Get);
    }

    #[test]
    fn test_get_note_404_is_not_translated() {
        let proxy = FakeProxy::new();
        proxy.push_status(404, "Not found");
        let client = NoteClient::new(BASE, proxy);

        let err = block_on(client.get_note(999)).unwrap_err();

        assert_eq!(
            err,
            Error::Http {
                status: 404,
                message: "Not found".to_string()
            }
        );
    }

    #[test]
    fn test_get_note_by_url_encodes_query() {
        let proxy = FakeProxy::new();
        proxy.push_ok(200, note_json("COMPLETED"));
        let client = NoteClient::new(BASE, proxy);

        block_on(client.get_note_by_url("https://www.youtube.com/watch?v=abc")).unwrap();

        assert_eq!(
            client.proxy().requests()[0].url,
            "http://localhost:8000/api/v1/notes/by-url/?video_url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dabc"
        );
    }

    #[test]
    fn test_get_note_by_url_not_found() {
        let proxy = FakeProxy::new();
        proxy.push_status(404, "Note not found for this video");
        let client = NoteClient::new(BASE, proxy);

        let err = block_on(client.get_note_by_url("https://www.youtube.com/watch?v=none")).unwrap_err();

        assert_eq!(err, Error::NotFound);
        assert_eq!(err.to_string(), "Note not found");
    }

    #[test]
    fn test_only_404_means_not_found() {
        for status in [0u16, 400, 401, 403, 410, 500] {
            let proxy = FakeProxy::new();
            proxy.push_status(status, "boom");
            let client = NoteClient::new(BASE, proxy);

            let err = block_on(client.get_note_by_url("https://www.youtube.com/watch?v=x")).unwrap_err();

            assert_ne!(err, Error::NotFound, "status {}", status);
        }
    }

    #[test]
    fn test_transport_failure_propagates() {
        let proxy = FakeProxy::new();
        proxy.push_status(0, "Network error");
        let client = NoteClient::new(BASE, proxy);

        let err = block_on(client.get_note(1)).unwrap_err();

        assert_eq!(err, Error::Transport("Network error".to_string()));
    }

    #[test]
    fn test_malformed_note_is_decode_error() {
        let proxy = FakeProxy::new();
        proxy.push_ok(200, json!({"id": "not-a-number"}));
        let client = NoteClient::new(BASE, proxy);

        assert!(matches!(block_on(client.get_note(1)), Err(Error::Decode(_))));
    }
}
