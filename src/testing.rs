/// Scripted fakes for the HTTP, proxy, session and storage seams
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use serde_json::{Map, Value};

use crate::auth::{AuthUser, Session};
use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::messages::{ProxyRequest, ProxyResponse};
use crate::proxy::{ProxyTransport, SessionSource};
use crate::storage::KeyValueStore;

#[derive(Default)]
pub struct FakeHttp {
    requests: RefCell<Vec<HttpRequest>>,
    responses: RefCell<VecDeque<Result<HttpResponse>>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        FakeHttp::default()
    }

    pub fn push_response(&self, status: u16, body: &str) {
        self.responses.borrow_mut().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn push_error(&self, message: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(Error::Transport(message.to_string())));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl HttpTransport for FakeHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Transport("no scripted response".to_string())))
    }
}

#[derive(Default)]
pub struct FakeProxy {
    requests: RefCell<Vec<ProxyRequest>>,
    responses: RefCell<VecDeque<ProxyResponse>>,
}

impl FakeProxy {
    pub fn new() -> Self {
        FakeProxy::default()
    }

    pub fn push_ok(&self, status: u16, data: Value) {
        self.responses.borrow_mut().push_back(ProxyResponse {
            ok: true,
            status,
            data: Some(data),
            error: None,
        });
    }

    pub fn push_status(&self, status: u16, error: &str) {
        self.responses
            .borrow_mut()
            .push_back(ProxyResponse::failure(status, error));
    }

    pub fn requests(&self) -> Vec<ProxyRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl ProxyTransport for FakeProxy {
    async fn relay(&self, request: ProxyRequest) -> ProxyResponse {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| ProxyResponse::failure(0, "no scripted response"))
    }
}

pub struct FakeSessions(pub Result<Option<Session>>);

impl SessionSource for FakeSessions {
    async fn current_session(&self) -> Result<Option<Session>> {
        self.0.clone()
    }
}

pub fn session(access_token: &str) -> Session {
    Session {
        access_token: access_token.to_string(),
        refresh_token: "refresh".to_string(),
        token_type: "bearer".to_string(),
        expires_in: Some(3600),
        expires_at: None,
        user: AuthUser {
            id: "user-1".to_string(),
            email: Some("a@b.c".to_string()),
        },
    }
}

/// In-memory `KeyValueStore`; `failing_writes` rejects every set and remove
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<BTreeMap<String, Value>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn failing_writes() -> Self {
        MemoryStore {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.items.borrow_mut().insert(key.to_string(), value);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Storage("QUOTA_BYTES quota exceeded".to_string()));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get_many(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let items = self.items.borrow();
        Ok(keys
            .iter()
            .filter_map(|key| items.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn set_many(&self, items: Map<String, Value>) -> Result<()> {
        self.check_writable()?;
        self.items.borrow_mut().extend(items);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}
