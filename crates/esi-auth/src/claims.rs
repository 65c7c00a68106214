//! Access-token claim decoding
//!
//! Access tokens issued by the SSO are JWTs. The payload is decoded here
//! WITHOUT verifying the signature: the result is only used to skip tokens
//! that are clearly stale and to show which character a token belongs to.
//! It is not an authorization decision and must not become one without real
//! signature verification against the issuer's published keys.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

/// Subset of the access-token payload this crate reads.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Claims {
    /// Expiry, unix seconds
    #[serde(default)]
    pub exp: Option<i64>,
    /// `CHARACTER:EVE:<character_id>`
    #[serde(default)]
    pub sub: Option<String>,
    /// Character name
    #[serde(default)]
    pub name: Option<String>,
    /// Granted scopes; a single scope is sent as a bare string
    #[serde(default, deserialize_with = "scopes")]
    pub scp: Vec<String>,
}

impl Claims {
    /// Decode the payload segment of a JWT. Returns `None` for anything that
    /// is not three dot-separated segments with a base64url JSON payload.
    pub fn decode(token: &str) -> Option<Self> {
        let mut segments = token.split('.');
        let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
        if segments.next().is_some() {
            return None;
        }
        // Some issuers pad their segments; the no-pad engine rejects '='.
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Character id parsed from the `sub` claim.
    pub fn character_id(&self) -> Option<u64> {
        self.sub
            .as_deref()?
            .strip_prefix("CHARACTER:EVE:")?
            .parse()
            .ok()
    }

    /// True when the token carries an expiry claim later than `now`.
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp > now)
    }
}

fn scopes<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(scope) => vec![scope],
        OneOrMany::Many(scopes) => scopes,
    })
}

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// True when `access_token` decodes and has not expired.
///
/// Tokens without an `exp` claim, or that fail to decode, are invalid.
pub fn access_token_is_valid(access_token: &str, now: i64) -> bool {
    Claims::decode(access_token).is_some_and(|claims| claims.is_valid_at(now))
}

/// Unsigned JWT carrying `payload`, for tests across the crate.
#[cfg(test)]
pub(crate) fn test_jwt(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","kid":"JWT-Signature-Key","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.c2lnbmF0dXJl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_sso_payload() {
        let token = test_jwt(json!({
            "scp": ["esi-markets.structure_markets.v1", "esi-universe.read_structures.v1"],
            "sub": "CHARACTER:EVE:2112625428",
            "name": "Mara Vex",
            "exp": 1_700_000_000,
            "iss": "https://login.eveonline.com",
        }));
        let claims = Claims::decode(&token).unwrap();
        assert_eq!(claims.exp, Some(1_700_000_000));
        assert_eq!(claims.name.as_deref(), Some("Mara Vex"));
        assert_eq!(claims.character_id(), Some(2_112_625_428));
        assert_eq!(claims.scp.len(), 2);
    }

    #[test]
    fn single_scope_string_is_accepted() {
        let token = test_jwt(json!({ "scp": "publicData", "exp": 1 }));
        let claims = Claims::decode(&token).unwrap();
        assert_eq!(claims.scp, vec!["publicData"]);
    }

    #[test]
    fn future_expiry_is_valid() {
        let now = unix_now();
        let token = test_jwt(json!({ "exp": now + 600 }));
        assert!(access_token_is_valid(&token, now));
    }

    #[test]
    fn past_expiry_is_invalid() {
        let now = unix_now();
        let token = test_jwt(json!({ "exp": now - 1 }));
        assert!(!access_token_is_valid(&token, now));
        let boundary = test_jwt(json!({ "exp": now }));
        assert!(!access_token_is_valid(&boundary, now));
    }

    #[test]
    fn missing_expiry_is_invalid() {
        let token = test_jwt(json!({ "sub": "CHARACTER:EVE:1" }));
        assert!(!access_token_is_valid(&token, 0));
    }

    #[test]
    fn garbage_tokens_are_invalid() {
        for token in ["", "not-a-jwt", "a.b", "a.%%%.c", "a.b.c.d"] {
            assert!(Claims::decode(token).is_none(), "decoded {token:?}");
            assert!(!access_token_is_valid(token, 0));
        }
    }

    #[test]
    fn padded_payload_still_decodes() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":50}"#);
        assert!(payload.ends_with('='));
        let token = format!("h.{payload}.s");
        assert_eq!(Claims::decode(&token).unwrap().exp, Some(50));
    }

    #[test]
    fn foreign_subject_has_no_character_id() {
        let token = test_jwt(json!({ "sub": "APP:EVE:99" }));
        assert_eq!(Claims::decode(&token).unwrap().character_id(), None);
    }
}
