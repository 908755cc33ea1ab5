//! Transport adapter over `reqwest`, the application-grade HTTP client.
//!
//! Failures follow the shape of a high-level HTTP library error: a message,
//! plus the response (status and body) when the server answered.

use async_trait::async_trait;
use connector::{
    decode_body, status_failure_message, CallOptions, DrupalResult, Headers, NativeFailure,
    NativeTransport, PreparedRequest, TransportAdapter,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::state::AdapterState;

const NAME: &str = "Reqwest";

/// Response attached to a [`ReqwestFailure`] when the server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseData {
    pub status: u16,
    /// Raw response body.
    pub data: String,
}

/// Native failure shape of [`ReqwestTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqwestFailure {
    pub message: String,
    pub response: Option<ResponseData>,
}

impl ReqwestFailure {
    /// A failure that never reached the server (connect error, bad header…).
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: None,
        }
    }

    /// A failure carrying a non-2xx response.
    pub fn from_status(status: u16, data: impl Into<String>) -> Self {
        Self {
            message: status_failure_message(status),
            response: Some(ResponseData {
                status,
                data: data.into(),
            }),
        }
    }
}

impl From<reqwest::Error> for ReqwestFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::from_message(err.to_string())
    }
}

impl NativeFailure for ReqwestFailure {
    fn body_text(&self) -> Option<&str> {
        self.response.as_ref().map(|r| r.data.as_str())
    }

    fn message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// [`TransportAdapter`] backed by a [`reqwest::Client`].
///
/// The default client is `reqwest::Client::new()`. Install a custom client
/// (timeouts, proxies, TLS roots) with [`NativeTransport::set_client`].
pub struct ReqwestTransport {
    state: AdapterState<reqwest::Client>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            state: AdapterState::new(reqwest::Client::new()),
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

    async fn exchange(&self, prepared: PreparedRequest) -> Result<Vec<u8>, ReqwestFailure> {
        let method = reqwest::Method::from_bytes(prepared.method.as_bytes())
            .map_err(|e| ReqwestFailure::from_message(e.to_string()))?;

        let mut request = self.client().request(method, prepared.url.as_str());
        for (name, value) in &prepared.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = prepared.body {
            request = request.body(body);
        }

        debug!(url = %prepared.url, "dispatching request");
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.bytes().await?.to_vec());
        }
        let data = match response.bytes().await {
            Ok(body) => String::from_utf8_lossy(&body).into_owned(),
            Err(err) => {
                debug!(error = %err, "error response body unreadable");
                String::new()
            }
        };
        Err(ReqwestFailure::from_status(status.as_u16(), data))
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.state.base_url())
            .field("default_client", &self.state.is_default_client())
            .finish()
    }
}

#[async_trait]
impl TransportAdapter for ReqwestTransport {
    fn name(&self) -> &'static str {
        NAME
    }

    #[tracing::instrument(name = "transport.call", skip(self, options), fields(transport = NAME))]
    async fn call(&self, method: &str, path: &str, options: CallOptions) -> DrupalResult<Value> {
        let prepared = self.state.prepare(NAME, method, path, &options)?;
        match self.exchange(prepared).await {
            Ok(body) => decode_body(NAME, &body),
            Err(failure) => {
                warn!(
                    status = failure.response.as_ref().map(|r| r.status),
                    error = %failure.message,
                    "request failed"
                );
                Err(self.get_drupal_error(Some(&failure)))
            }
        }
    }

    fn add_default_headers(&self, headers: Headers) -> &dyn TransportAdapter {
        self.state.merge_headers(headers);
        self
    }

    fn default_headers(&self) -> Headers {
        self.state.headers()
    }
}

impl NativeTransport for ReqwestTransport {
    type Client = reqwest::Client;
    type Failure = ReqwestFailure;

    fn set_client(&self, client: Option<reqwest::Client>) -> &Self {
        self.state.set_client(client);
        self
    }

    fn client(&self) -> reqwest::Client {
        self.state.client()
    }

    fn is_default_client(&self) -> bool {
        self.state.is_default_client()
    }
}
