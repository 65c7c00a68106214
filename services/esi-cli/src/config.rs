//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! A file named by `--config` or CONFIG_PATH must exist; the default
//! `esi.toml` is optional so anonymous commands work without one.
//! The forward proxy is read from the environment here, once, and carried in
//! `HttpSettings`; nothing downstream looks at the environment again.

use common::HttpSettings;
use esi_auth::{
    CALLBACK_PORT, ClientConfig, DEFAULT_CACHE_FILE, DEFAULT_CALLBACK_TIMEOUT_SECS,
    DEFAULT_REDIRECT_URI, DEFAULT_SSO_HOST,
};
use esi_client::ClientOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked up in the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "esi.toml";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sso: SsoConfig,
    #[serde(default)]
    pub esi: ClientOptions,
    #[serde(default)]
    pub http: HttpSettings,
}

/// Single sign-on registration and token cache settings
#[derive(Debug, Deserialize)]
pub struct SsoConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// May be supplied by ESI_CLIENT_ID instead
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,
    #[serde(default = "default_callback_timeout")]
    pub callback_timeout_secs: u64,
}

fn default_host() -> String {
    DEFAULT_SSO_HOST.to_string()
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

fn default_cache_file() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_FILE)
}

fn default_callback_port() -> u16 {
    CALLBACK_PORT
}

fn default_callback_timeout() -> u64 {
    DEFAULT_CALLBACK_TIMEOUT_SECS
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            client_id: String::new(),
            redirect_uri: default_redirect_uri(),
            scope: String::new(),
            cache_file: default_cache_file(),
            callback_port: default_callback_port(),
            callback_timeout_secs: default_callback_timeout(),
        }
    }
}

impl SsoConfig {
    /// Commands that authorize need a registered application.
    pub fn require_client_id(&self) -> common::Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(common::Error::Config(
                "sso.client_id is required (or set ESI_CLIENT_ID)".into(),
            ));
        }
        Ok(())
    }

    /// Registration for `esi_auth::TokenManager`.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            host: self.host.clone(),
            redirect_uri: self.redirect_uri.clone(),
            client_id: self.client_id.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// - ESI_CLIENT_ID replaces `sso.client_id`
    /// - HTTPS_PROXY / https_proxy fill `http.proxy` when the file has none
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Like `load`, but a missing file yields the defaults plus environment
    /// overlays.
    pub fn load_optional(path: &Path) -> common::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::from_toml("")
            }
            Err(e) => Err(e.into()),
        }
    }

    fn from_toml(contents: &str) -> common::Result<Self> {
        let mut config: Config = toml::from_str(contents)?;

        if let Ok(client_id) = std::env::var("ESI_CLIENT_ID") {
            let client_id = client_id.trim().to_owned();
            if !client_id.is_empty() {
                config.sso.client_id = client_id;
            }
        }
        config.http = config.http.with_env_proxy();

        config.validate()?;
        Ok(config)
    }

    /// `sso.client_id` is checked by `SsoConfig::require_client_id` only for
    /// commands that authorize.
    fn validate(&self) -> common::Result<()> {
        for (field, value) in [
            ("sso.host", &self.sso.host),
            ("sso.redirect_uri", &self.sso.redirect_uri),
            ("esi.base_url", &self.esi.base_url),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "{field} must start with http:// or https://, got: {value}"
                )));
            }
        }

        let redirect = reqwest::Url::parse(&self.sso.redirect_uri).map_err(|e| {
            common::Error::Config(format!("sso.redirect_uri is not a valid URL: {e}"))
        })?;
        if redirect.port_or_known_default() != Some(self.sso.callback_port) {
            return Err(common::Error::Config(format!(
                "sso.redirect_uri {} does not point at sso.callback_port {}",
                self.sso.redirect_uri, self.sso.callback_port
            )));
        }

        if self.sso.callback_timeout_secs == 0 {
            return Err(common::Error::Config(
                "sso.callback_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.http.timeout_secs == 0 {
            return Err(common::Error::Config(
                "http.timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Config file named by the CLI arg or the CONFIG_PATH env var, if any.
    pub fn explicit_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        std::env::var("CONFIG_PATH").ok().map(PathBuf::from)
    }
}
