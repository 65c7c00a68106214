//! EVE single sign-on token acquisition
//!
//! Obtains, caches, and refreshes access tokens for the ESI API using the
//! OAuth2 authorization-code flow with PKCE and a local callback listener.
//! This crate has no dependency on the API client; callers hand the
//! resulting access token to whatever makes the resource requests.
//!
//! Token flow:
//! 1. `TokenManager::acquire_token()` loads the cached `TokenRecord`
//! 2. A record whose JWT `exp` is in the future is returned as-is
//! 3. An expired record with a refresh token goes through `token::refresh_token()`
//! 4. Otherwise `TokenManager::authorize()` binds the `CallbackListener`,
//!    opens the browser at `pkce::build_authorization_url()`, waits for the
//!    code, and calls `token::exchange_code()`
//! 5. Every new record overwrites the cache via `TokenStore::save()`

pub mod browser;
pub mod callback;
pub mod claims;
pub mod config;
pub mod constants;
pub mod error;
pub mod manager;
pub mod pkce;
pub mod store;
pub mod token;

pub use browser::{BrowserLauncher, LogBrowser, SystemBrowser};
pub use callback::CallbackListener;
pub use claims::Claims;
pub use config::ClientConfig;
pub use constants::*;
pub use error::{Error, Result};
pub use manager::TokenManager;
pub use pkce::{PkceChallenge, build_authorization_url, compute_challenge, generate_state};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{TokenRecord, exchange_code, refresh_token};
