//! Client registration settings for the authorization flow

use serde::Deserialize;

use crate::constants::{AUTHORIZE_PATH, DEFAULT_REDIRECT_URI, DEFAULT_SSO_HOST, TOKEN_PATH};
use crate::error::{Error, Result};

/// Application registration used for one authorization attempt.
///
/// `host` is the authorization server's base URL (scheme and authority,
/// no path). `scope` is a space-separated list as registered with the
/// application.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub scope: String,
}

fn default_host() -> String {
    DEFAULT_SSO_HOST.to_string()
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

impl ClientConfig {
    /// Config against the production authorization server with the default
    /// redirect URI.
    pub fn new(client_id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            redirect_uri: default_redirect_uri(),
            client_id: client_id.into(),
            scope: scope.into(),
        }
    }

    pub fn authorize_endpoint(&self) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), AUTHORIZE_PATH)
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), TOKEN_PATH)
    }

    /// Reject configs that cannot produce a working authorization URL.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config("client_id must not be empty".into()));
        }
        for (field, value) in [("host", &self.host), ("redirect_uri", &self.redirect_uri)] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(Error::Config(format!(
                    "{field} must start with http:// or https://, got: {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_host_and_path() {
        let mut config = ClientConfig::new("abc123", "publicData");
        assert_eq!(
            config.authorize_endpoint(),
            "https://login.eveonline.com/v2/oauth/authorize"
        );
        config.host = "http://127.0.0.1:9999/".into();
        assert_eq!(
            config.token_endpoint(),
            "http://127.0.0.1:9999/v2/oauth/token"
        );
    }

    #[test]
    fn validate_rejects_empty_client_id() {
        let config = ClientConfig::new("  ", "publicData");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("client_id"), "got: {err}");
    }

    #[test]
    fn validate_rejects_schemeless_redirect() {
        let mut config = ClientConfig::new("abc123", "publicData");
        config.redirect_uri = "localhost:3001/callback".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("redirect_uri"), "got: {err}");
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"client_id":"abc"}"#).unwrap();
        assert_eq!(config.host, DEFAULT_SSO_HOST);
        assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
        assert!(config.scope.is_empty());
        assert!(config.validate().is_ok());
    }
}
