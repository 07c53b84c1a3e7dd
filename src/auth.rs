/// Supabase (GoTrue) auth client with the session persisted in local storage
///
/// The client is constructed explicitly by each execution context and shared
/// by reference; there is no global instance. Call [`AuthClient::shutdown`]
/// when the owning surface goes away.
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpTransport};
use crate::session::SessionStore;
use crate::storage::KeyValueStore;

/// Sessions this close to expiry are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    pub fn needs_refresh(&self, now: i64) -> bool {
        self.expires_at
            .map(|expires_at| expires_at - now <= REFRESH_MARGIN_SECS)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

type Listener = Rc<dyn Fn(AuthEvent, Option<&Session>)>;
type Listeners = Rc<RefCell<Vec<(u64, Listener)>>>;

/// Handle returned by [`AuthClient::on_auth_state_change`]
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Vec<(u64, Listener)>>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

pub struct AuthClient<S, H> {
    supabase_url: String,
    anon_key: String,
    storage_key: String,
    sessions: SessionStore<S>,
    http: H,
    clock: fn() -> i64,
    listeners: Listeners,
    next_listener_id: Cell<u64>,
}

impl<S: KeyValueStore, H: HttpTransport> AuthClient<S, H> {
    pub fn new(config: &Config, store: S, http: H, clock: fn() -> i64) -> Self {
        AuthClient {
            storage_key: storage_key_for(&config.supabase_url),
            supabase_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            sessions: SessionStore::new(store),
            http,
            clock,
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener_id: Cell::new(0),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Current session, refreshed first when it is about to expire
    pub async fn get_session(&self) -> Result<Option<Session>> {
        let Some(raw) = self.sessions.get_item(&self.storage_key).await? else {
            return Ok(None);
        };

        let session: Session = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("Discarding unreadable stored session: {}", e);
                self.sessions.remove_item(&self.storage_key).await?;
                return Ok(None);
            }
        };

        if !session.needs_refresh((self.clock)()) {
            return Ok(Some(session));
        }

        match self.refresh(&session.refresh_token).await {
            Ok(refreshed) => {
                self.persist(&refreshed).await?;
                self.notify(AuthEvent::TokenRefreshed, Some(&refreshed));
                Ok(Some(refreshed))
            }
            Err(Error::Auth(message)) => {
                log::info!("Session refresh rejected: {}", message);
                self.sessions.remove_item(&self.storage_key).await?;
                self.notify(AuthEvent::SignedOut, None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let request = self
            .auth_request(HttpMethod::Post, "token?grant_type=password")
            .json_body(&PasswordGrant { email, password })?;
        let session = self.token_request(request).await?;

        self.persist(&session).await?;
        log::info!("Signed in as {}", session.user.email.as_deref().unwrap_or(&session.user.id));
        self.notify(AuthEvent::SignedIn, Some(&session));
        Ok(session)
    }

    /// The local session is dropped even if the server call fails
    pub async fn sign_out(&self) -> Result<()> {
        let stored = self
            .sessions
            .get_item(&self.storage_key)
            .await?
            .and_then(|raw| serde_json::from_str::<Session>(&raw).ok());

        if let Some(session) = stored {
            let request = self
                .auth_request(HttpMethod::Post, "logout")
                .header("Authorization", format!("Bearer {}", session.access_token));
            match self.http.send(request).await {
                Ok(response) if !response.is_success() => {
                    log::warn!("Logout returned HTTP {}", response.status)
                }
                Err(e) => log::warn!("Logout request failed: {}", e),
                Ok(_) => {}
            }
        }

        self.sessions.remove_item(&self.storage_key).await?;
        self.notify(AuthEvent::SignedOut, None);
        Ok(())
    }

    pub fn on_auth_state_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(AuthEvent, Option<&Session>) + 'static,
    {
        let id = self.next_listener_id.get();
        self.next_listener_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Drop every subscriber; the client is unusable for notifications afterwards
    pub fn shutdown(&self) {
        self.listeners.borrow_mut().clear();
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let request = self
            .auth_request(HttpMethod::Post, "token?grant_type=refresh_token")
            .json_body(&RefreshGrant { refresh_token })?;
        self.token_request(request).await
    }

    async fn token_request(&self, request: HttpRequest) -> Result<Session> {
        let response = self.http.send(request).await?;
        let body: Value = serde_json::from_str(&response.body).unwrap_or(Value::Null);

        if !response.is_success() {
            return Err(Error::Auth(auth_error_message(&body, response.status)));
        }

        let mut session: Session = serde_json::from_value(body)?;
        if session.expires_at.is_none() {
            session.expires_at = session.expires_in.map(|secs| (self.clock)() + secs);
        }
        Ok(session)
    }

    async fn persist(&self, session: &Session) -> Result<()> {
        let raw = serde_json::to_string(session)?;
        self.sessions.set_item(&self.storage_key, &raw).await
    }

    fn auth_request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}/auth/v1/{}", self.supabase_url, path))
            .header("apikey", self.anon_key.clone())
    }

    fn notify(&self, event: AuthEvent, session: Option<&Session>) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event, session);
        }
    }
}

/// `sb-<project-ref>-auth-token`, the key supabase-js uses
pub fn storage_key_for(supabase_url: &str) -> String {
    let project_ref = url::Url::parse(supabase_url)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.split('.').next().unwrap_or(host).to_string()))
        .unwrap_or_else(|| "local".to_string());
    format!("sb-{}-auth-token", project_ref)
}

fn auth_error_message(body: &Value, status: u16) -> String {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Authentication failed (HTTP {})", status))
}
