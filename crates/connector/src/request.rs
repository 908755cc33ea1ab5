//! Transport-independent request preparation and response decoding.
//!
//! Every transport adapter turns a logical call into a [`PreparedRequest`]
//! through [`prepare_request`] and only then into its native request type.
//! URL resolution, header merging, and basic-auth encoding are therefore
//! identical whichever transport is installed.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use thiserror::Error;

use crate::errors::{DrupalError, DrupalResult};

/// Header name → value. Names are matched case-insensitively when merging.
pub type Headers = BTreeMap<String, String>;

const ACCEPT: &str = "Accept";
const AUTHORIZATION: &str = "Authorization";
const CONTENT_TYPE: &str = "Content-Type";
const JSON_MEDIA_TYPE: &str = "application/json";

// ---------------------------------------------------------------------------
// Call options
// ---------------------------------------------------------------------------

/// Username/password pair sent as an HTTP basic `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the `Authorization` header value: `Basic base64(user:pass)`.
    pub fn header_value(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Per-call options accepted by [`crate::TransportAdapter::call`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    /// Headers for this call only; they override default headers of the
    /// same name.
    pub headers: Headers,
    pub auth: Option<BasicAuth>,
    /// JSON request body. Sent with `Content-Type: application/json`.
    pub body: Option<Value>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

// ---------------------------------------------------------------------------
// Prepared request
// ---------------------------------------------------------------------------

/// Reasons a logical call cannot be turned into a wire request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("no base URL configured for relative path '{0}'")]
    MissingBaseUrl(String),

    #[error("request body could not be encoded: {0}")]
    Body(#[from] serde_json::Error),
}

/// A fully resolved request, ready to be mapped onto a native client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// Upper-cased method token.
    pub method: String,
    /// Absolute URL.
    pub url: String,
    /// Merged headers in insertion order, one entry per name.
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Resolves and merges a logical call into a [`PreparedRequest`].
///
/// Header precedence, lowest first: `default_headers`, `options.headers`,
/// then the basic-auth header when `options.auth` is set.
pub fn prepare_request(
    base_url: Option<&str>,
    default_headers: &Headers,
    method: &str,
    path: &str,
    options: &CallOptions,
) -> Result<PreparedRequest, RequestError> {
    let method = normalize_method(method)?;
    let url = resolve_url(base_url, path)?;

    let mut headers: Vec<(String, String)> = Vec::new();
    for (name, value) in default_headers.iter().chain(options.headers.iter()) {
        set_header(&mut headers, name, value);
    }
    if let Some(auth) = &options.auth {
        set_header(&mut headers, AUTHORIZATION, &auth.header_value());
    }
    if !has_header(&headers, ACCEPT) {
        headers.push((ACCEPT.to_owned(), JSON_MEDIA_TYPE.to_owned()));
    }

    let body = match &options.body {
        Some(value) => {
            if !has_header(&headers, CONTENT_TYPE) {
                headers.push((CONTENT_TYPE.to_owned(), JSON_MEDIA_TYPE.to_owned()));
            }
            Some(serde_json::to_vec(value)?)
        }
        None => None,
    };

    Ok(PreparedRequest {
        method,
        url,
        headers,
        body,
    })
}

/// Decodes a successful response body.
///
/// An empty (or all-whitespace) body decodes to [`Value::Null`]. Anything
/// that is not JSON is a transport failure attributed to `transport`.
pub fn decode_body(transport: &str, body: &[u8]) -> DrupalResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| DrupalError::transport_failure(transport, e))
}

fn normalize_method(method: &str) -> Result<String, RequestError> {
    let is_token = !method.is_empty()
        && method
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
    if !is_token {
        return Err(RequestError::InvalidMethod(method.to_owned()));
    }
    Ok(method.to_ascii_uppercase())
}

fn resolve_url(base_url: Option<&str>, path: &str) -> Result<String, RequestError> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(path.to_owned());
    }
    let base = base_url
        .filter(|b| !b.is_empty())
        .ok_or_else(|| RequestError::MissingBaseUrl(path.to_owned()))?;
    Ok(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    headers.push((name.to_owned(), value.to_owned()));
}
