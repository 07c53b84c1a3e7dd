/// UI surfaces and the services they share
pub mod components;
pub mod content;
pub mod export_bar;
pub mod hooks;
pub mod login;
pub mod overlay;
pub mod popup;
pub mod settings;

use std::rc::Rc;

use crate::api::NoteClient;
use crate::auth::AuthClient;
use crate::config::Config;
use crate::error::Result;
use crate::http::ReqwestTransport;
use crate::paste::PendingPaste;
use crate::poller::Poller;
use crate::proxy::RuntimeRelay;
use crate::settings::SettingsStore;
use crate::storage::ChromeStore;

pub type UiAuth = AuthClient<ChromeStore, ReqwestTransport>;

/// Constructed once per surface and handed down through a Yew context
#[derive(Clone)]
pub struct Services {
    pub config: Rc<Config>,
    pub notes: Rc<NoteClient<RuntimeRelay>>,
    pub settings: Rc<SettingsStore<ChromeStore>>,
    pub pending: Rc<PendingPaste<ChromeStore>>,
    pub poller: Poller,
    /// Only the popup talks to the auth server; content scripts ask the background worker
    pub auth: Option<Rc<UiAuth>>,
}

impl Services {
    pub fn new(config: Config, with_auth: bool) -> Services {
        let auth = with_auth.then(|| {
            Rc::new(AuthClient::new(
                &config,
                ChromeStore::local(),
                ReqwestTransport::new(),
                crate::browser::now_unix_seconds,
            ))
        });
        Services {
            notes: Rc::new(NoteClient::new(&config.api_base_url, RuntimeRelay)),
            settings: Rc::new(SettingsStore::new(ChromeStore::sync())),
            pending: Rc::new(PendingPaste::new(ChromeStore::local())),
            poller: Poller::new(config.poll),
            auth,
            config: Rc::new(config),
        }
    }

    pub fn from_build_env(with_auth: bool) -> Result<Services> {
        Ok(Services::new(Config::from_build_env()?, with_auth))
    }
}

impl PartialEq for Services {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.config, &other.config)
    }
}
