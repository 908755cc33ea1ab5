//! Fetch-style transport adapter.
//!
//! The native mechanism is a [`Fetch`] implementation: a single function
//! that resolves to a [`FetchResponse`] for *any* HTTP answer (checking `ok`
//! is the caller's job) and rejects with a [`FetchError`] only when no
//! answer was obtained. [`DefaultFetch`] is used until another mechanism is
//! installed; tests install stubs.

use std::sync::Arc;

use async_trait::async_trait;
use connector::{
    decode_body, status_failure_message, CallOptions, DrupalResult, Headers, NativeFailure,
    NativeTransport, PreparedRequest, TransportAdapter,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::state::AdapterState;

const NAME: &str = "Fetch";

// ---------------------------------------------------------------------------
// Native mechanism
// ---------------------------------------------------------------------------

/// A settled HTTP exchange, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// `true` for 2xx statuses.
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

/// Rejection raised when no HTTP answer was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The function-like mechanism a [`FetchTransport`] delegates to.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: PreparedRequest) -> Result<FetchResponse, FetchError>;
}

/// Default [`Fetch`] mechanism, built on a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct DefaultFetch {
    client: reqwest::Client,
}

impl DefaultFetch {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetch for DefaultFetch {
    async fn fetch(&self, request: PreparedRequest) -> Result<FetchResponse, FetchError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| FetchError::new(e.to_string()))?;
        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::new(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::new(e.to_string()))?;

        Ok(FetchResponse {
            ok: status.is_success(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// Failure shape
// ---------------------------------------------------------------------------

/// Native failure shape of [`FetchTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The server answered with `ok == false`.
    ///
    /// `message` is the status text, or a status-bearing fallback when the
    /// status has no reason phrase.
    Response {
        response: FetchResponse,
        message: String,
    },
    /// The fetch itself was rejected.
    Rejected(FetchError),
}

impl FetchFailure {
    pub fn from_response(response: FetchResponse) -> Self {
        let message = if response.status_text.trim().is_empty() {
            status_failure_message(response.status)
        } else {
            response.status_text.clone()
        };
        Self::Response { response, message }
    }
}

impl NativeFailure for FetchFailure {
    fn body_text(&self) -> Option<&str> {
        match self {
            Self::Response { response, .. } => Some(&response.body),
            Self::Rejected(_) => None,
        }
    }

    fn message(&self) -> Option<&str> {
        match self {
            Self::Response { message, .. } => Some(message),
            Self::Rejected(err) => Some(&err.message),
        }
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// [`TransportAdapter`] that delegates each request to a [`Fetch`] mechanism.
pub struct FetchTransport {
    state: AdapterState<Arc<dyn Fetch>>,
}

impl FetchTransport {
    pub fn new() -> Self {
        Self {
            state: AdapterState::new(Arc::new(DefaultFetch::new())),
        }
    }

    /// Sets the base URL relative paths are resolved against.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.state.set_base_url(base_url.into());
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.state.base_url()
    }
}

impl Default for FetchTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchTransport")
            .field("base_url", &self.state.base_url())
            .field("default_client", &self.state.is_default_client())
            .finish()
    }
}

#[async_trait]
impl TransportAdapter for FetchTransport {
    fn name(&self) -> &'static str {
        NAME
    }

    #[tracing::instrument(name = "transport.call", skip(self, options), fields(transport = NAME))]
    async fn call(&self, method: &str, path: &str, options: CallOptions) -> DrupalResult<Value> {
        let prepared = self.state.prepare(NAME, method, path, &options)?;
        debug!(url = %prepared.url, "dispatching request");

        let failure = match self.client().fetch(prepared).await {
            Ok(response) if response.ok => return decode_body(NAME, response.body.as_bytes()),
            Ok(response) => {
                warn!(status = response.status, "request returned error status");
                FetchFailure::from_response(response)
            }
            Err(err) => {
                warn!(error = %err, "fetch rejected");
                FetchFailure::Rejected(err)
            }
        };
        Err(self.get_drupal_error(Some(&failure)))
    }

    fn add_default_headers(&self, headers: Headers) -> &dyn TransportAdapter {
        self.state.merge_headers(headers);
        self
    }

    fn default_headers(&self) -> Headers {
        self.state.headers()
    }
}

impl NativeTransport for FetchTransport {
    type Client = Arc<dyn Fetch>;
    type Failure = FetchFailure;

    fn set_client(&self, client: Option<Arc<dyn Fetch>>) -> &Self {
        self.state.set_client(client);
        self
    }

    fn client(&self) -> Arc<dyn Fetch> {
        self.state.client()
    }

    fn is_default_client(&self) -> bool {
        self.state.is_default_client()
    }
}
