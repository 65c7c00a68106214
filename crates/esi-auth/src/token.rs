//! Token endpoint interactions
//!
//! Two grants, both POSTed as `application/x-www-form-urlencoded` to the
//! configured host's token endpoint:
//! 1. `authorization_code`, completing the interactive PKCE flow
//! 2. `refresh_token`, renewing an expired access token
//!
//! Neither call retries. Failures are returned to the caller, who decides
//! whether to fall back to interactive authorization.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::claims::Claims;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Token endpoint response, cached verbatim as the single record on disk.
///
/// `expires_in` is the lifetime in seconds reported at issue time. The
/// authoritative expiry is the `exp` claim inside `access_token`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenRecord {
    /// Unverified claims of the access token.
    pub fn claims(&self) -> Option<Claims> {
        Claims::decode(&self.access_token)
    }

    /// True while the access token's `exp` claim lies after `now`.
    pub fn is_valid_at(&self, now: i64) -> bool {
        crate::claims::access_token_is_valid(&self.access_token, now)
    }

    /// Refresh token, if one was issued and is non-empty.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Exchange an authorization code for tokens.
///
/// Sends the original PKCE verifier (never the challenge) to prove this
/// client started the flow.
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &ClientConfig,
    code: &str,
    verifier: &str,
) -> Result<TokenRecord> {
    let endpoint = config.token_endpoint();
    debug!(endpoint = %endpoint, "exchanging authorization code");

    let response = client
        .post(&endpoint)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenRecord>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))
}

/// Obtain a new access token with a refresh token.
///
/// A 400/401/403 means the refresh token was revoked or has expired; it is
/// reported as `InvalidCredentials` so the caller can re-authorize.
pub async fn refresh_token(
    client: &reqwest::Client,
    config: &ClientConfig,
    refresh: &str,
) -> Result<TokenRecord> {
    let endpoint = config.token_endpoint();
    debug!(endpoint = %endpoint, "refreshing access token");

    let response = client
        .post(&endpoint)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh),
            ("client_id", config.client_id.as_str()),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        if matches!(status.as_u16(), 400 | 401 | 403) {
            return Err(Error::InvalidCredentials(format!(
                "refresh token rejected ({status}): {body}"
            )));
        }

        return Err(Error::TokenExchange(format!(
            "token refresh returned {status}: {body}"
        )));
    }

    let mut record = response
        .json::<TokenRecord>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid refresh response: {e}")))?;

    if record.refresh_token().is_none() {
        record.refresh_token = Some(refresh.to_string());
    }
    Ok(record)
}
