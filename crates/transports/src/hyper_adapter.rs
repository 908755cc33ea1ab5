//! Transport adapter over a bare `hyper` client.
//!
//! This is the raw-exchange variant: no redirects, no convenience layer.
//! TLS comes from a `hyper-rustls` connector that also accepts plain HTTP.
//! A failure is either a completed exchange with a non-2xx status (status,
//! reason phrase, raw response text) or an I/O-level error.

use async_trait::async_trait;
use bytes::Bytes;
use connector::{
    decode_body, status_failure_message, CallOptions, DrupalResult, Headers, NativeFailure,
    NativeTransport, PreparedRequest, TransportAdapter,
};
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use tracing::{debug, warn};

use crate::state::AdapterState;

const NAME: &str = "Hyper";

/// The native client type used by [`HyperTransport`].
pub type HyperClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Builds the default client: `https` against the webpki roots, `http` as is.
pub fn default_hyper_client() -> HyperClient {
    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Native failure shape of [`HyperTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HyperFailure {
    /// The exchange completed with a non-2xx status.
    Exchange {
        status: u16,
        reason: String,
        response_text: String,
    },
    /// The exchange did not complete.
    Io { message: String },
}

impl HyperFailure {
    /// A completed exchange. An absent or empty reason phrase is replaced by
    /// a message naming the status.
    pub fn exchange(status: u16, reason: Option<&str>, response_text: impl Into<String>) -> Self {
        let reason = match reason {
            Some(reason) if !reason.trim().is_empty() => reason.to_owned(),
            _ => status_failure_message(status),
        };
        Self::Exchange {
            status,
            reason,
            response_text: response_text.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

impl NativeFailure for HyperFailure {
    fn body_text(&self) -> Option<&str> {
        match self {
            Self::Exchange { response_text, .. } => Some(response_text),
            Self::Io { .. } => None,
        }
    }

    fn message(&self) -> Option<&str> {
        match self {
            Self::Exchange { reason, .. } => Some(reason),
            Self::Io { message } => Some(message),
        }
    }
}

/// [`TransportAdapter`] backed by a `hyper-util` legacy client.
pub struct HyperTransport {
    state: AdapterState<HyperClient>,
}

impl HyperTransport {
    pub fn new() -> Self {
        Self {
            state: AdapterState::new(default_hyper_client()),
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

    async fn exchange(&self, prepared: PreparedRequest) -> Result<Bytes, HyperFailure> {
        let request = build_request(prepared).map_err(HyperFailure::io)?;
        let response = self
            .client()
            .request(request)
            .await
            .map_err(|e| HyperFailure::io(e.to_string()))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| HyperFailure::io(e.to_string()))?
            .to_bytes();

        if !status.is_success() {
            return Err(HyperFailure::exchange(
                status.as_u16(),
                status.canonical_reason(),
                String::from_utf8_lossy(&body),
            ));
        }
        Ok(body)
    }
}

fn build_request(prepared: PreparedRequest) -> Result<Request<Full<Bytes>>, String> {
    let method = Method::from_bytes(prepared.method.as_bytes()).map_err(|e| e.to_string())?;
    let mut builder = Request::builder().method(method).uri(prepared.url.as_str());
    for (name, value) in &prepared.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .body(Full::new(Bytes::from(prepared.body.unwrap_or_default())))
        .map_err(|e| e.to_string())
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("base_url", &self.state.base_url())
            .field("default_client", &self.state.is_default_client())
            .finish()
    }
}

#[async_trait]
impl TransportAdapter for HyperTransport {
    fn name(&self) -> &'static str {
        NAME
    }

    #[tracing::instrument(name = "transport.call", skip(self, options), fields(transport = NAME))]
    async fn call(&self, method: &str, path: &str, options: CallOptions) -> DrupalResult<Value> {
        let prepared = self.state.prepare(NAME, method, path, &options)?;
        debug!(url = %prepared.url, "dispatching request");
        match self.exchange(prepared).await {
            Ok(body) => decode_body(NAME, &body),
            Err(failure) => {
                warn!(failure = ?failure, "request failed");
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

impl NativeTransport for HyperTransport {
    type Client = HyperClient;
    type Failure = HyperFailure;

    fn set_client(&self, client: Option<HyperClient>) -> &Self {
        self.state.set_client(client);
        self
    }

    fn client(&self) -> HyperClient {
        self.state.client()
    }

    fn is_default_client(&self) -> bool {
        self.state.is_default_client()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_body_passes_through() {
        let failure = HyperFailure::Exchange {
            status: 418,
            reason: "I'm a teapot".into(),
            response_text: r#"{"code":42,"error":"Answer"}"#.into(),
        };
        assert_eq!(
            HyperTransport::new().get_drupal_error(Some(&failure)).to_string(),
            "DrupalError: 42 Answer"
        );
    }

    #[test]
    fn message_only_is_wrapped() {
        let failure = HyperFailure::io("Foo");
        assert_eq!(
            HyperTransport::new().get_drupal_error(Some(&failure)).to_string(),
            "DrupalError: 100 Hyper method failed: \"Foo\""
        );
    }

    #[test]
    fn absent_failure_is_still_an_error() {
        let err = HyperTransport::new().get_drupal_error(None);
        assert_eq!(err.code(), 100);
    }

    #[test]
    fn unparseable_response_text_falls_back_to_reason() {
        let failure = HyperFailure::Exchange {
            status: 500,
            reason: "Internal Server Error".into(),
            response_text: "Fatal error".into(),
        };
        assert_eq!(
            HyperTransport::new().get_drupal_error(Some(&failure)).to_string(),
            "DrupalError: 100 Hyper method failed: \"Internal Server Error\""
        );
    }

    #[test]
    fn status_without_reason_phrase_reports_the_status() {
        let failure = HyperFailure::exchange(599, None, "upstream exploded");
        assert_eq!(
            HyperTransport::new().get_drupal_error(Some(&failure)).to_string(),
            "DrupalError: 100 Hyper method failed: \"Request failed with status code 599\""
        );
        assert_eq!(
            HyperFailure::exchange(502, Some("Bad Gateway"), ""),
            HyperFailure::Exchange {
                status: 502,
                reason: "Bad Gateway".into(),
                response_text: String::new(),
            }
        );
    }

    #[test]
    fn build_request_carries_headers_and_body() {
        let prepared = PreparedRequest {
            method: "POST".into(),
            url: "http://example.com/node".into(),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Some(b"{}".to_vec()),
        };
        let request = build_request(prepared).unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri(), "http://example.com/node");
        assert_eq!(request.headers()["content-type"], "application/json");
    }

    #[test]
    fn build_request_accepts_https_urls() {
        let prepared = PreparedRequest {
            method: "GET".into(),
            url: "https://example.com/jsonapi".into(),
            headers: Vec::new(),
            body: None,
        };
        let request = build_request(prepared).unwrap();
        assert_eq!(request.uri().scheme_str(), Some("https"));
    }

    #[tokio::test]
    async fn set_client_without_argument_restores_default() {
        let transport = HyperTransport::new();
        transport.set_client(Some(default_hyper_client()));
        assert!(!transport.is_default_client());
        assert!(transport.set_client(None).is_default_client());
    }
}
