/// API proxy bridge: UI contexts hand HTTP calls to the background worker,
/// which attaches the auth token, performs the call and relays one envelope back.
use crate::auth::{AuthClient, Session};
use crate::browser;
use crate::error::{CONTEXT_INVALIDATED_MARKER, Error, Result};
use crate::http::{HttpRequest, HttpTransport};
use crate::messages::{AuthStatus, BackgroundReply, ProxyRequest, ProxyResponse, RuntimeMessage};
use crate::storage::KeyValueStore;

/// Where the background worker gets the current session from
#[allow(async_fn_in_trait)]
pub trait SessionSource {
    async fn current_session(&self) -> Result<Option<Session>>;
}

impl<S: KeyValueStore, H: HttpTransport> SessionSource for AuthClient<S, H> {
    async fn current_session(&self) -> Result<Option<Session>> {
        self.get_session().await
    }
}

/// Stands in for the auth client when the build carries no auth configuration
pub struct Unconfigured(pub Error);

impl SessionSource for Unconfigured {
    async fn current_session(&self) -> Result<Option<Session>> {
        Err(self.0.clone())
    }
}

/// Sends a request envelope across the context boundary; never fails, the
/// failure is inside the envelope
#[allow(async_fn_in_trait)]
pub trait ProxyTransport {
    async fn relay(&self, request: ProxyRequest) -> ProxyResponse;

    async fn fetch_json(&self, request: ProxyRequest) -> Result<serde_json::Value> {
        self.relay(request).await.into_result()
    }
}

/// Perform one proxied call on behalf of a UI context
pub async fn handle_api_proxy<A, H>(request: ProxyRequest, auth: &A, http: &H) -> ProxyResponse
where
    A: SessionSource,
    H: HttpTransport,
{
    let session = match auth.current_session().await {
        Ok(session) => session,
        Err(e) => {
            log::error!("Proxy: failed to get auth session: {}", e);
            return ProxyResponse::failure(0, format!("Failed to get auth session: {}", e));
        }
    };

    let keep_authorization = request.has_header("Authorization");
    let mut http_request: HttpRequest = request.into();
    if let Some(session) = session {
        if !keep_authorization {
            http_request.headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", session.access_token),
            );
        }
    }

    let method = http_request.method;
    let url = http_request.url.clone();
    match http.send(http_request).await {
        Ok(response) => ProxyResponse::from_http(response),
        Err(e) => {
            log::error!("Proxy: {:?} {} failed: {}", method, url, e);
            let message = match e {
                Error::Transport(message) => message,
                other => other.to_string(),
            };
            ProxyResponse::failure(0, message)
        }
    }
}

/// Answer one runtime message; exhaustive over [`RuntimeMessage`]
pub async fn dispatch<A, H>(message: RuntimeMessage, auth: &A, http: &H) -> BackgroundReply
where
    A: SessionSource,
    H: HttpTransport,
{
    match message {
        RuntimeMessage::ApiProxyRequest(request) => {
            BackgroundReply::Proxy(handle_api_proxy(request, auth, http).await)
        }
        RuntimeMessage::GetAuthStatus => {
            let session = auth.current_session().await.unwrap_or_else(|e| {
                log::warn!("Auth status lookup failed: {}", e);
                None
            });
            BackgroundReply::AuthStatus(AuthStatus { session })
        }
    }
}

/// UI-side relay over `chrome.runtime.sendMessage`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeRelay;

impl ProxyTransport for RuntimeRelay {
    async fn relay(&self, request: ProxyRequest) -> ProxyResponse {
        let message = RuntimeMessage::ApiProxyRequest(request);
        let message_js = match browser::to_js(&message) {
            Ok(js) => js,
            Err(e) => return ProxyResponse::failure(0, e.to_string()),
        };

        match browser::send_runtime_message(message_js).await {
            Ok(reply) if reply.is_null() || reply.is_undefined() => {
                ProxyResponse::failure(0, "No response from background worker")
            }
            Ok(reply) => serde_wasm_bindgen::from_value(reply).unwrap_or_else(|e| {
                ProxyResponse::failure(0, format!("Malformed proxy response: {}", e))
            }),
            Err(Error::ContextInvalidated) => {
                log::error!("Extension context invalidated; the page needs a refresh");
                ProxyResponse::failure(0, CONTEXT_INVALIDATED_MARKER)
            }
            Err(e) => ProxyResponse::failure(0, e.to_string()),
        }
    }
}

/// Ask the background worker for the session it sees
pub async fn request_auth_status() -> Result<AuthStatus> {
    let message_js = browser::to_js(&RuntimeMessage::GetAuthStatus)?;
    let reply = browser::send_runtime_message(message_js).await?;
    Ok(serde_wasm_bindgen::from_value(reply)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::{FakeHttp, FakeSessions, session};
    use futures::executor::block_on;
    use serde_json::json;

    fn get_note_request() -> ProxyRequest {
        ProxyRequest::get("http://localhost:8000/api/v1/notes/1")
    }

    #[test]
    fn test_successful_get_attaches_token() {
        let http = FakeHttp::new();
        http.push_response(200, r#"{"id": 1, "title": "Test Note"}"#);
        let auth = FakeSessions(Ok(Some(session("token-1"))));

        let response = block_on(handle_api_proxy(get_note_request(), &auth, &http));

        assert_eq!(
            response,
            ProxyResponse {
                ok: true,
                status: 200,
                data: Some(json!({"id": 1, "title": "Test Note"})),
                error: None,
            }
        );
        let sent = &http.requests()[0];
        assert_eq!(sent.method, HttpMethod::Get);
        assert_eq!(sent.headers["Authorization"], "Bearer token-1");
        assert_eq!(sent.headers["Content-Type"], "application/json");
    }

    #[test]
    fn test_post_body_is_forwarded_without_session() {
        let http = FakeHttp::new();
        http.push_response(201, r#"{"id": 2}"#);
        let auth = FakeSessions(Ok(None));
        let request = ProxyRequest::new(HttpMethod::Post, "http://localhost:8000/api/v1/notes")
            .json_body(&json!({"video_url": "https://www.youtube.com/watch?v=test"}))
            .unwrap();

        let response = block_on(handle_api_proxy(request, &auth, &http));

        assert!(response.ok);
        assert_eq!(response.status, 201);
        let sent = &http.requests()[0];
        assert!(!sent.headers.contains_key("Authorization"));
        assert_eq!(
            sent.body.as_deref(),
            Some(r#"{"video_url":"https://www.youtube.com/watch?v=test"}"#)
        );
    }

    #[test]
    fn test_existing_authorization_is_kept() {
        let http = FakeHttp::new();
        http.push_response(200, r#"{"url": "https://notion.so/p"}"#);
        let auth = FakeSessions(Ok(Some(session("supabase-token"))));
        let request = ProxyRequest::new(HttpMethod::Post, "https://api.notion.com/v1/pages")
            .header("Authorization", "Bearer secret_notion");

        block_on(handle_api_proxy(request, &auth, &http));

        assert_eq!(http.requests()[0].headers["Authorization"], "Bearer secret_notion");
    }

    #[test]
    fn test_http_error_is_relayed_not_thrown() {
        let http = FakeHttp::new();
        http.push_response(404, r#"{"detail": "Not found"}"#);
        let auth = FakeSessions(Ok(None));

        let response = block_on(handle_api_proxy(get_note_request(), &auth, &http));

        assert!(!response.ok);
        assert_eq!(response.status, 404);
        assert_eq!(response.data, Some(json!({"detail": "Not found"})));
    }

    #[test]
    fn test_network_error_becomes_status_zero() {
        let http = FakeHttp::new();
        http.push_error("Network error");
        let auth = FakeSessions(Ok(None));

        let response = block_on(handle_api_proxy(get_note_request(), &auth, &http));

        assert_eq!(response, ProxyResponse::failure(0, "Network error"));
    }

    #[test]
    fn test_session_failure_is_reported_without_dispatch() {
        let http = FakeHttp::new();
        let auth = FakeSessions(Err(Error::Storage("quota".to_string())));

        let response = block_on(handle_api_proxy(get_note_request(), &auth, &http));

        assert!(!response.ok);
        assert_eq!(response.status, 0);
        assert_eq!(
            response.error.as_deref(),
            Some("Failed to get auth session: Storage error: quota")
        );
        assert!(http.requests().is_empty());
    }

    #[test]
    fn test_ok_iff_success_status() {
        for status in [200u16, 201, 204, 299, 301, 400, 401, 404, 500, 503] {
            let http = FakeHttp::new();
            http.push_response(status, "{}");
            let auth = FakeSessions(Ok(None));

            let response = block_on(handle_api_proxy(get_note_request(), &auth, &http));

            assert_eq!(response.ok, (200..300).contains(&status), "status {}", status);
            assert_eq!(response.status, status);
            assert_eq!(http.requests().len(), 1);
        }
    }

    #[test]
    fn test_dispatch_auth_status() {
        let http = FakeHttp::new();
        let auth = FakeSessions(Ok(Some(session("token-1"))));

        let reply = block_on(dispatch(RuntimeMessage::GetAuthStatus, &auth, &http));

        match reply {
            BackgroundReply::AuthStatus(status) => {
                assert_eq!(status.session.unwrap().access_token, "token-1")
            }
            other => panic!("unexpected reply {:?}", other),
        }
        assert!(http.requests().is_empty());
    }

    #[test]
    fn test_dispatch_auth_status_hides_lookup_errors() {
        let auth = FakeSessions(Err(Error::Storage("quota".to_string())));

        let reply = block_on(dispatch(RuntimeMessage::GetAuthStatus, &auth, &FakeHttp::new()));

        assert_eq!(reply, BackgroundReply::AuthStatus(AuthStatus { session: None }));
    }

    #[test]
    fn test_unconfigured_auth_fails_every_proxy_call() {
        let auth = Unconfigured(Error::Config("Missing Supabase credentials".to_string()));
        let http = FakeHttp::new();

        let response = block_on(handle_api_proxy(get_note_request(), &auth, &http));

        assert_eq!(
            response.error.as_deref(),
            Some("Failed to get auth session: Missing Supabase credentials")
        );
    }
}
