//! Outbound HTTP client construction
//!
//! Every outbound call (authorization server and resource API) goes through a
//! `reqwest::Client` built here. The forward proxy is resolved once, at
//! startup, into `HttpSettings` and handed to the factory; reqwest's own
//! environment proxy detection is disabled so no other call site consults
//! the environment.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Environment variables consulted (in order) for the forward proxy URL.
pub const PROXY_ENV_VARS: &[&str] = &["HTTPS_PROXY", "https_proxy"];

/// Settings for the shared outbound HTTP client.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HttpSettings {
    /// Forward proxy URL applied to all outbound requests
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("esi-rs/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpSettings {
    /// Fill `proxy` from the environment when it is not already set.
    ///
    /// Empty values are ignored.
    pub fn with_env_proxy(mut self) -> Self {
        if self.proxy.is_none() {
            self.proxy = PROXY_ENV_VARS
                .iter()
                .filter_map(|var| std::env::var(var).ok())
                .map(|value| value.trim().to_owned())
                .find(|value| !value.is_empty());
        }
        self
    }
}

/// Build the outbound HTTP client from resolved settings.
pub fn build_http_client(settings: &HttpSettings) -> Result<reqwest::Client> {
    if settings.timeout_secs == 0 {
        return Err(Error::Config("http timeout_secs must be greater than 0".into()));
    }

    let mut builder = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .user_agent(settings.user_agent.clone());

    if let Some(ref proxy_url) = settings.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| Error::HttpClient(format!("invalid proxy url {proxy_url}: {e}")))?;
        debug!(proxy = %proxy_url, "routing outbound requests through proxy");
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| Error::HttpClient(format!("building http client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    #[test]
    fn defaults_have_no_proxy() {
        let settings = HttpSettings::default();
        assert!(settings.proxy.is_none());
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.user_agent.starts_with("esi-rs/"));
    }

    #[test]
    fn env_proxy_fills_missing_value() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe {
            remove_env("https_proxy");
            set_env("HTTPS_PROXY", "http://proxy.local:3128");
        }
        let settings = HttpSettings::default().with_env_proxy();
        assert_eq!(settings.proxy.as_deref(), Some("http://proxy.local:3128"));
        unsafe { remove_env("HTTPS_PROXY") };
    }

    #[test]
    fn explicit_proxy_wins_over_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("HTTPS_PROXY", "http://env-proxy:3128") };
        let settings = HttpSettings {
            proxy: Some("http://file-proxy:8080".into()),
            ..HttpSettings::default()
        }
        .with_env_proxy();
        assert_eq!(settings.proxy.as_deref(), Some("http://file-proxy:8080"));
        unsafe { remove_env("HTTPS_PROXY") };
    }

    #[test]
    fn blank_env_proxy_is_ignored() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe {
            set_env("HTTPS_PROXY", "   ");
            remove_env("https_proxy");
        }
        let settings = HttpSettings::default().with_env_proxy();
        assert!(settings.proxy.is_none());
        unsafe { remove_env("HTTPS_PROXY") };
    }

    #[test]
    fn builds_client_with_and_without_proxy() {
        assert!(build_http_client(&HttpSettings::default()).is_ok());

        let proxied = HttpSettings {
            proxy: Some("http://127.0.0.1:3128".into()),
            ..HttpSettings::default()
        };
        assert!(build_http_client(&proxied).is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let settings = HttpSettings {
            timeout_secs: 0,
            ..HttpSettings::default()
        };
        let err = build_http_client(&settings).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"), "got: {err}");
    }

    #[test]
    fn deserializes_partial_table() {
        let settings: HttpSettings = toml::from_str("proxy = \"http://p:1\"").unwrap();
        assert_eq!(settings.proxy.as_deref(), Some("http://p:1"));
        assert_eq!(settings.timeout_secs, 30);
    }
}
