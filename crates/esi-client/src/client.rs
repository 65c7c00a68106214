//! Generic ESI request primitive
//!
//! Every resource method funnels through `EsiClient::send`, which:
//! - prefixes the path with `{base_url}/{version}`
//! - always sends `datasource`, then the caller's parameters, skipping
//!   absent and empty values
//! - sends `accept` and `accept-language` (caller-overridable) and the
//!   bearer token when one is configured
//! - parses the body as JSON only when `content-type` is exactly
//!   `application/json; charset=UTF-8`, otherwise keeps it as text, no
//!   matter the status code
//! - turns non-2xx into `Error::Api` carrying the parsed error message
//!
//! There are no retries here; callers own their retry policy.

use common::Secret;
use reqwest::Method;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://esi.evetech.net";
pub const DEFAULT_VERSION: &str = "latest";
pub const DEFAULT_DATASOURCE: &str = "tranquility";
pub const DEFAULT_LANGUAGE: &str = "en";

/// The only content type parsed as JSON.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Response header carrying the page count of paginated resources.
pub const PAGES_HEADER: &str = "x-pages";

/// Query parameters for a request; `None` and empty values are not sent.
pub type Params<'a> = [(&'a str, Option<String>)];

/// Where and how to reach the API.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientOptions {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_datasource")]
    pub datasource: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_datasource() -> String {
    DEFAULT_DATASOURCE.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            version: default_version(),
            datasource: default_datasource(),
            language: default_language(),
        }
    }
}

/// Parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    Text(String),
}

impl Body {
    /// Message for a failed request: the JSON `error` field when present,
    /// otherwise the whole body.
    pub fn error_message(&self) -> String {
        match self {
            Body::Json(value) => value
                .get("error")
                .and_then(|e| e.as_str())
                .map(str::to_owned)
                .unwrap_or_else(|| value.to_string()),
            Body::Text(text) => text.clone(),
        }
    }

    /// Deserialize a JSON body into `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Body::Json(value) => {
                serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
            }
            Body::Text(text) => Err(Error::UnexpectedBody(text)),
        }
    }
}

/// A successful response with its pagination hint.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// Value of `x-pages`, when the resource is paginated
    pub pages: Option<u32>,
    pub body: Body,
}

/// ESI client bound to one base URL, version, language, and (optionally)
/// one access token.
#[derive(Debug, Clone)]
pub struct EsiClient {
    http: reqwest::Client,
    options: ClientOptions,
    token: Option<Secret<String>>,
}

impl EsiClient {
    pub fn new(http: reqwest::Client, options: ClientOptions) -> Self {
        Self {
            http,
            options,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(Secret::new(token.into()));
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.options.language = language.into();
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Absolute URL for an API path such as `/universe/types/`.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}{}",
            self.options.base_url.trim_end_matches('/'),
            self.options.version.trim_matches('/'),
            path
        )
    }

    fn headers(&self, overrides: Option<HeaderMap>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&self.options.language).map_err(|e| {
                Error::InvalidRequest(format!("language {:?}: {e}", self.options.language))
            })?,
        );

        if let Some(ref token) = self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
                .map_err(|e| Error::InvalidRequest(format!("access token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        if let Some(overrides) = overrides {
            for (name, value) in overrides.iter() {
                headers.insert(name.clone(), value.clone());
            }
        }
        Ok(headers)
    }

    /// Issue a request and return the parsed body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &Params<'_>,
        headers: Option<HeaderMap>,
    ) -> Result<Body> {
        Ok(self.send(method, path, params, headers).await?.body)
    }

    /// Issue a request and return the parsed body with the page count.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        params: &Params<'_>,
        headers: Option<HeaderMap>,
    ) -> Result<Response> {
        let query = query_pairs(&self.options.datasource, params);
        let headers = self.headers(headers)?;

        let response = self
            .http
            .request(method, self.url(path))
            .query(&query)
            .headers(headers)
            .send()
            .await
            .map_err(|e| Error::Http(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        metrics::counter!("esi_requests_total", "status" => status.as_u16().to_string())
            .increment(1);

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            == Some(JSON_CONTENT_TYPE);
        let pages = response
            .headers()
            .get(PAGES_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());

        let text = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading body of {path}: {e}")))?;
        let body = if is_json {
            Body::Json(serde_json::from_str(&text).map_err(|e| Error::Decode(e.to_string()))?)
        } else {
            Body::Text(text)
        };

        debug!(status = status.as_u16(), ?pages, json = is_json, "response received");

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: body.error_message(),
            });
        }

        Ok(Response {
            status: status.as_u16(),
            pages,
            body,
        })
    }

    /// GET a JSON resource into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &Params<'_>) -> Result<T> {
        self.request(Method::GET, path, params, None)
            .await?
            .into_json()
    }

    /// GET one page of a JSON resource into `T`, with the total page count.
    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &Params<'_>,
    ) -> Result<(T, Option<u32>)> {
        let response = self.send(Method::GET, path, params, None).await?;
        Ok((response.body.into_json()?, response.pages))
    }
}

/// `datasource` first, then every present, non-empty caller parameter.
fn query_pairs<'a>(datasource: &'a str, params: &'a Params<'a>) -> Vec<(&'a str, &'a str)> {
    std::iter::once(("datasource", datasource))
        .chain(params.iter().filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (*name, v))
        }))
        .collect()
}

/// `page` parameter; page 0 means "not specified".
pub(crate) fn page_param(page: Option<u32>) -> Option<String> {
    page.filter(|p| *p > 0).map(|p| p.to_string())
}
