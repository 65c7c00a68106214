//! Shared building blocks for the ESI workspace: secret redaction, the
//! common error type, and the outbound HTTP client factory.

mod error;
pub mod http;
mod secret;

pub use error::{Error, Result};
pub use http::{HttpSettings, build_http_client};
pub use secret::Secret;
