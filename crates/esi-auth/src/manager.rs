//! Token acquisition
//!
//! `acquire_token` prefers the cache, then a refresh, then the interactive
//! browser flow:
//!
//! ```text
//! START -> cached token valid?        -> return cached
//!       -> expired, has refresh token -> refresh -> persist -> return
//!       -> otherwise                  -> authorize (listen, browser, callback)
//!                                        -> exchange code -> persist -> return
//! ```
//!
//! A failed refresh is returned as-is; it is never escalated to interactive
//! authorization. Callers that want that fallback call `authorize` on
//! `Error::InvalidCredentials`.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::browser::{BrowserLauncher, SystemBrowser};
use crate::callback::CallbackListener;
use crate::claims::unix_now;
use crate::config::ClientConfig;
use crate::constants::{CALLBACK_PORT, DEFAULT_CACHE_FILE, DEFAULT_CALLBACK_TIMEOUT_SECS};
use crate::error::Result;
use crate::pkce::{PkceChallenge, build_authorization_url, generate_state};
use crate::store::{FileTokenStore, TokenStore};
use crate::token::{self, TokenRecord};

/// Produces usable access tokens for one user.
pub struct TokenManager {
    http: reqwest::Client,
    store: Arc<dyn TokenStore>,
    browser: Arc<dyn BrowserLauncher>,
    callback_addr: SocketAddr,
    callback_timeout: Duration,
}

impl TokenManager {
    /// Manager with the file cache in the working directory, the system
    /// browser, and the callback listener on `127.0.0.1:3001`.
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            store: Arc::new(FileTokenStore::new(DEFAULT_CACHE_FILE)),
            browser: Arc::new(SystemBrowser),
            callback_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, CALLBACK_PORT)),
            callback_timeout: Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = browser;
        self
    }

    pub fn with_callback_addr(mut self, addr: SocketAddr) -> Self {
        self.callback_addr = addr;
        self
    }

    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// The cached record, valid or not.
    pub async fn cached(&self) -> Option<TokenRecord> {
        self.store.load().await
    }

    /// Return a usable token, touching the network only when the cache
    /// cannot be used as-is.
    pub async fn acquire_token(&self, config: &ClientConfig) -> Result<TokenRecord> {
        config.validate()?;

        if let Some(cached) = self.store.load().await {
            if cached.is_valid_at(unix_now()) {
                info!("using cached access token");
                return Ok(cached);
            }
            if let Some(refresh) = cached.refresh_token() {
                info!("cached access token expired, refreshing");
                return self.refresh(config, refresh).await;
            }
            info!("cached token expired and has no refresh token");
        }

        self.authorize(config).await
    }

    /// Run the refresh grant and overwrite the cache with the result.
    pub async fn refresh(&self, config: &ClientConfig, refresh: &str) -> Result<TokenRecord> {
        let record = token::refresh_token(&self.http, config, refresh).await?;
        self.store.save(&record).await?;
        info!(character = ?character_name(&record), "access token refreshed");
        Ok(record)
    }

    /// Run the full interactive PKCE flow and overwrite the cache with the
    /// result.
    pub async fn authorize(&self, config: &ClientConfig) -> Result<TokenRecord> {
        config.validate()?;

        let pkce = PkceChallenge::generate();
        let state = generate_state();
        let url = build_authorization_url(config, &pkce, &state)?;

        let listener = CallbackListener::bind(self.callback_addr, state).await?;
        info!(addr = %listener.local_addr(), "waiting for authorization callback");

        if let Err(e) = self.browser.open(url.as_str()) {
            warn!(error = %e, url = %url, "could not open a browser, open the URL manually");
        }

        let code = listener.wait_for_code(self.callback_timeout).await?;
        let record = token::exchange_code(&self.http, config, &code, &pkce.verifier).await?;
        self.store.save(&record).await?;

        info!(character = ?character_name(&record), "authorization complete");
        Ok(record)
    }
}

fn character_name(record: &TokenRecord) -> Option<String> {
    record.claims().and_then(|claims| claims.name)
}
