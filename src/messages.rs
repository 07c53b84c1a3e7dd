/// Message types exchanged between content scripts, the popup and the background worker
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::Session;
use crate::error::{CONTEXT_INVALIDATED_MARKER, Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Every message the background worker understands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeMessage {
    ApiProxyRequest(ProxyRequest),
    GetAuthStatus,
}

/// An HTTP call to be issued by the background worker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyRequest {
    pub url: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ProxyRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        ProxyRequest {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// JSON GET, the shape every backend read uses
    pub fn get(url: impl Into<String>) -> Self {
        ProxyRequest::new(HttpMethod::Get, url).header("Content-Type", "application/json")
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    pub fn json_body<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.keys().any(|key| key.eq_ignore_ascii_case(name))
    }
}

impl From<ProxyRequest> for HttpRequest {
    fn from(request: ProxyRequest) -> Self {
        HttpRequest {
            method: request.method,
            url: request.url,
            headers: request.headers,
            body: request.body,
        }
    }
}

/// Normalized reply; `status` is 0 when no HTTP exchange happened
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyResponse {
    pub ok: bool,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProxyResponse {
    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        ProxyResponse {
            ok: false,
            status,
            data: None,
            error: Some(error.into()),
        }
    }

    /// JSON bodies are parsed, other text is relayed as a string, empty bodies as absent
    pub fn from_http(response: HttpResponse) -> Self {
        let ok = response.is_success();
        let data = if response.body.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(&response.body).unwrap_or(Value::String(response.body)))
        };
        let error = if ok {
            None
        } else {
            Some(
                data.as_ref()
                    .and_then(error_detail)
                    .unwrap_or_else(|| format!("HTTP {}", response.status)),
            )
        };

        ProxyResponse {
            ok,
            status: response.status,
            data,
            error,
        }
    }

    pub fn into_result(self) -> Result<Value> {
        if self.ok {
            return Ok(self.data.unwrap_or(Value::Null));
        }

        let message = self.error.unwrap_or_else(|| format!("HTTP {}", self.status));
        if self.status == 0 {
            if message.contains(CONTEXT_INVALIDATED_MARKER) {
                Err(Error::ContextInvalidated)
            } else {
                Err(Error::Transport(message))
            }
        } else {
            Err(Error::Http {
                status: self.status,
                message,
            })
        }
    }
}

/// FastAPI puts messages in `detail`, Notion and GitHub in `message`
fn error_detail(data: &Value) -> Option<String> {
    ["detail", "message"].iter().find_map(|field| match data.get(*field)? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

/// Reply to [`RuntimeMessage::GetAuthStatus`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthStatus {
    pub session: Option<Session>,
}

/// What the background worker sends back through `sendResponse`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BackgroundReply {
    Proxy(ProxyResponse),
    AuthStatus(AuthStatus),
}
