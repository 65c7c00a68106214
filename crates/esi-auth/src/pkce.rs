//! PKCE (Proof Key for Code Exchange) implementation per RFC 7636
//!
//! Generates the code verifier and S256 challenge for one authorization
//! attempt, the opaque `state` value used to correlate the callback, and
//! the authorization URL the browser is sent to. The verifier stays in
//! memory and is only transmitted in the final token exchange.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::config::ClientConfig;
use crate::constants::CODE_CHALLENGE_METHOD;
use crate::error::{Error, Result};

/// Verifier/challenge pair for a single authorization attempt.
#[derive(Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
    pub method: &'static str,
}

impl PkceChallenge {
    pub fn generate() -> Self {
        let verifier = generate_verifier();
        let challenge = compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
            method: CODE_CHALLENGE_METHOD,
        }
    }
}

impl std::fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("verifier", &"[REDACTED]")
            .field("challenge", &self.challenge)
            .field("method", &self.method)
            .finish()
    }
}

/// Generate a cryptographically random PKCE code verifier.
///
/// 32 random bytes encoded as URL-safe base64 without padding (43 chars,
/// the RFC 7636 minimum length).
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `challenge = BASE64URL(SHA256(verifier))`
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Opaque per-attempt `state` value (32 hex chars).
pub fn generate_state() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Build the authorization URL the browser is sent to.
pub fn build_authorization_url(
    config: &ClientConfig,
    pkce: &PkceChallenge,
    state: &str,
) -> Result<Url> {
    let endpoint = config.authorize_endpoint();
    let mut url = Url::parse(&endpoint)
        .map_err(|e| Error::Config(format!("invalid authorization endpoint {endpoint}: {e}")))?;

    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("client_id", &config.client_id)
        .append_pair("scope", &config.scope)
        .append_pair("code_challenge", &pkce.challenge)
        .append_pair("code_challenge_method", pkce.method)
        .append_pair("state", state);

    Ok(url)
}
