/// Background service worker: answers runtime messages for the UI contexts
/// and mirrors the sign-in state on the toolbar badge.
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::auth::{AuthClient, Session};
use crate::browser;
use crate::config::Config;
use crate::error::Result;
use crate::http::ReqwestTransport;
use crate::messages::{BackgroundReply, ProxyResponse, RuntimeMessage};
use crate::proxy::{SessionSource, Unconfigured, dispatch};
use crate::storage::ChromeStore;

/// Badge text and color for a sign-in state; `None` color leaves it unchanged
pub fn badge_for(signed_in: bool) -> (&'static str, Option<&'static str>) {
    if signed_in { ("", None) } else { ("!", Some("#F00")) }
}

/// Replies that reveal the sign-in state
pub fn signed_in_from_reply(reply: &BackgroundReply) -> Option<bool> {
    match reply {
        BackgroundReply::AuthStatus(status) => Some(status.session.is_some()),
        BackgroundReply::Proxy(_) => None,
    }
}

/// The worker's auth source; a build without Supabase settings still answers every message
pub enum WorkerAuth {
    Client(AuthClient<ChromeStore, ReqwestTransport>),
    Unconfigured(Unconfigured),
}

impl SessionSource for WorkerAuth {
    async fn current_session(&self) -> Result<Option<Session>> {
        match self {
            WorkerAuth::Client(client) => client.get_session().await,
            WorkerAuth::Unconfigured(unconfigured) => unconfigured.current_session().await,
        }
    }
}

struct Worker {
    auth: WorkerAuth,
    http: ReqwestTransport,
}

async fn update_badge(signed_in: bool) {
    let (text, color) = badge_for(signed_in);
    if let Err(e) = browser::set_badge(text, color).await {
        log::warn!("Failed to update badge: {}", e);
    }
}

fn reply_to_js(reply: &BackgroundReply) -> JsValue {
    browser::to_js(reply)
        .or_else(|e| browser::to_js(&ProxyResponse::failure(0, e.to_string())))
        .unwrap_or(JsValue::NULL)
}

pub fn start_background() {
    let auth = match Config::from_build_env() {
        Ok(config) => WorkerAuth::Client(AuthClient::new(
            &config,
            ChromeStore::local(),
            ReqwestTransport::new(),
            browser::now_unix_seconds,
        )),
        Err(e) => {
            log::error!("Auth is not configured: {}", e);
            WorkerAuth::Unconfigured(Unconfigured(e))
        }
    };

    if let WorkerAuth::Client(client) = &auth {
        // Lives as long as the worker, so the handle is never used
        let _subscription = client.on_auth_state_change(|event, session| {
            log::info!("Auth state changed: {:?}", event);
            let signed_in = session.is_some();
            spawn_local(update_badge(signed_in));
        });
    }

    let worker = Rc::new(Worker {
        auth,
        http: ReqwestTransport::new(),
    });

    {
        let worker = worker.clone();
        spawn_local(async move {
            let signed_in = matches!(worker.auth.current_session().await, Ok(Some(_)));
            update_badge(signed_in).await;
        });
    }

    let listener = Closure::wrap(Box::new(
        move |message: JsValue, _sender: JsValue, send_response: js_sys::Function| -> JsValue {
            let message: RuntimeMessage = match serde_wasm_bindgen::from_value(message) {
                Ok(message) => message,
                Err(e) => {
                    log::debug!("Ignoring unknown runtime message: {}", e);
                    return JsValue::FALSE;
                }
            };

            let worker = worker.clone();
            spawn_local(async move {
                let reply = dispatch(message, &worker.auth, &worker.http).await;
                if let Some(signed_in) = signed_in_from_reply(&reply) {
                    update_badge(signed_in).await;
                }
                if let Err(e) = send_response.call1(&JsValue::NULL, &reply_to_js(&reply)) {
                    log::error!("Failed to send response: {:?}", e);
                }
            });

            // Keeps the channel open for the async reply
            JsValue::TRUE
        },
    ) as Box<dyn FnMut(JsValue, JsValue, js_sys::Function) -> JsValue>);

    browser::add_runtime_message_listener(listener.as_ref().unchecked_ref());
    listener.forget();
    log::info!("Background worker started");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::AuthStatus;
    use crate::testing::session;

    #[test]
    fn test_badge_for() {
        assert_eq!(badge_for(true), ("", None));
        assert_eq!(badge_for(false), ("!", Some("#F00")));
    }

    #[test]
    fn test_only_auth_status_replies_touch_the_badge() {
        let signed_in = BackgroundReply::AuthStatus(AuthStatus {
            session: Some(session("t")),
        });
        let signed_out = BackgroundReply::AuthStatus(AuthStatus { session: None });
        let proxy = BackgroundReply::Proxy(ProxyResponse::failure(401, "Unauthorized"));

        assert_eq!(signed_in_from_reply(&signed_in), Some(true));
        assert_eq!(signed_in_from_reply(&signed_out), Some(false));
        assert_eq!(signed_in_from_reply(&proxy), None);
    }
}
