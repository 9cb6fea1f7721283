//! Process-wide context: one token store, one client, one session.

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::api::client::ApiClient;
use crate::api::transport::HttpTransport;
use crate::auth::{SessionManager, TokenStore};
use crate::config::{Config, FileStore};
use crate::notify::{ConsoleNotifier, Notifier};

pub struct App {
    pub config: Config,
    pub api: Arc<ApiClient>,
    pub notifier: Arc<dyn Notifier>,
    pub session: SessionManager,
}

impl App {
    /// Load config and storage, and wire the HTTP client and session.
    pub fn load(api_url: Option<String>) -> Result<Self> {
        let mut config = Config::load()?;
        config.apply_api_url(api_url);
        tracing::debug!("Using API at {}", config.api_url);

        let store = Arc::new(FileStore::open(Config::storage_path()?)?);
        let transport = Arc::new(HttpTransport::new(&config.api_url, config.timeout())?);
        let api = Arc::new(ApiClient::new(transport, TokenStore::new(store)));
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
        let session = SessionManager::new(api.clone(), notifier.clone());

        Ok(Self {
            config,
            api,
            notifier,
            session,
        })
    }

    /// Like `load`, then restore the session and require a logged-in user.
    pub async fn authenticated(api_url: Option<String>) -> Result<Self> {
        let mut app = Self::load(api_url)?;
        app.session.initialize().await;
        if !app.session.is_authenticated() {
            bail!("Not logged in. Run 'storefront login'.");
        }
        Ok(app)
    }
}
