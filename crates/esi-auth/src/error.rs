//! Error types for token acquisition

use std::net::SocketAddr;
use std::time::Duration;

/// Errors from the authorization flow, token endpoint, and token cache.
///
/// A missing or corrupt cache is not an error: `TokenStore::load` reports
/// it as `None` and the manager falls back to refresh or authorization.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("callback listener already in use on {0}")]
    ListenerInUse(SocketAddr),

    #[error("callback listener error: {0}")]
    Listener(String),

    #[error("no authorization callback received within {}s", .0.as_secs())]
    CallbackTimeout(Duration),

    #[error("browser launch failed: {0}")]
    Browser(String),

    #[error("invalid client configuration: {0}")]
    Config(String),

    #[error("token cache error: {0}")]
    Cache(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
