//! EVE single sign-on constants
//!
//! The authorization server and callback listener are fixed for this flow.
//! `ClientConfig::host` may point elsewhere (tests, Singularity), but the
//! paths below are appended to whichever host is configured.

/// Production authorization server
pub const DEFAULT_SSO_HOST: &str = "https://login.eveonline.com";

/// Authorization endpoint path (browser step)
pub const AUTHORIZE_PATH: &str = "/v2/oauth/authorize";

/// Token endpoint path for code exchange and refresh
pub const TOKEN_PATH: &str = "/v2/oauth/token";

/// Port the local callback listener binds to
pub const CALLBACK_PORT: u16 = 3001;

/// Redirect URI registered for the application; must reach the callback listener
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3001/callback";

/// File the most recent token record is cached in
pub const DEFAULT_CACHE_FILE: &str = "esi-token.json";

/// How long the callback listener waits for the browser before giving up.
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;

/// PKCE challenge method; the only one the authorization server accepts from us
pub const CODE_CHALLENGE_METHOD: &str = "S256";
