//! Transport port definitions and the shared error-normalization algorithm.
//!
//! The contract is split in two so that an installed transport can be held
//! behind `Arc<dyn TransportAdapter>` while each concrete adapter still
//! exposes its own native client and failure types:
//!
//! | Trait | Object-safe | Contents |
//! |-------|-------------|----------|
//! | [`TransportAdapter`] | yes | `call`, default headers, transport name |
//! | [`NativeTransport`] | no | `set_client` / `client`, `get_drupal_error` |
//!
//! Every adapter funnels its failures through [`normalize_failure`]. Adapters
//! only differ in how their native failure exposes a body string and a
//! message, which is what [`NativeFailure`] captures.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::{DrupalError, DrupalResult};
use crate::request::{CallOptions, Headers};

/// HTTP transport capability installed in a [`crate::ServiceCore`].
#[async_trait]
pub trait TransportAdapter: Send + Sync {
    /// Label used when wrapping native failures, e.g. `"Reqwest"`.
    fn name(&self) -> &'static str;

    /// Issues a request and returns the decoded JSON body.
    ///
    /// Network failures, non-2xx responses, undecodable bodies, and
    /// malformed requests all surface as a [`DrupalError`]; the native error
    /// type of the underlying client never escapes.
    async fn call(&self, method: &str, path: &str, options: CallOptions) -> DrupalResult<Value>;

    /// Merges `headers` into the headers sent with every subsequent call.
    fn add_default_headers(&self, headers: Headers) -> &dyn TransportAdapter;

    /// Returns a snapshot of the current default headers.
    fn default_headers(&self) -> Headers;
}

/// Access to an adapter's native client and native failure shape.
///
/// An adapter is either in the *default* state, using the documented
/// default client, or in the *set* state, using a client installed through
/// [`NativeTransport::set_client`]. Passing `None` returns it to the default
/// state.
pub trait NativeTransport: TransportAdapter {
    /// The underlying HTTP mechanism.
    type Client: Clone;

    /// The shape in which the underlying mechanism reports failures.
    type Failure: NativeFailure;

    fn set_client(&self, client: Option<Self::Client>) -> &Self;

    /// Returns whichever client is currently in use.
    fn client(&self) -> Self::Client;

    fn is_default_client(&self) -> bool;

    /// Converts a native failure into a [`DrupalError`]. Never panics.
    fn get_drupal_error(&self, failure: Option<&Self::Failure>) -> DrupalError {
        normalize_failure(self.name(), failure)
    }
}

/// How a native failure exposes the two fields normalization cares about.
pub trait NativeFailure {
    /// Raw response body, when the failure carries a response.
    fn body_text(&self) -> Option<&str>;

    /// Human-readable message of the native failure.
    fn message(&self) -> Option<&str>;
}

/// Message for a non-2xx answer that carries no usable reason phrase.
///
/// Every variant falls back to this text so a status such as 599 renders
/// the same whichever transport observed it.
pub fn status_failure_message(status: u16) -> String {
    format!("Request failed with status code {status}")
}

/// Structured error body returned by the remote API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    error: String,
}

/// Reduces any native failure to a [`DrupalError`].
///
/// 1. No failure at all: code 100 with an empty wrapped message.
/// 2. A body parsing as `{"code": <int>, "error": <string>}`: passed through.
/// 3. Any other body, or no body: code 100 wrapping the native message.
pub fn normalize_failure<F>(transport: &str, failure: Option<&F>) -> DrupalError
where
    F: NativeFailure + ?Sized,
{
    let Some(failure) = failure else {
        return DrupalError::transport_failure(transport, "");
    };

    if let Some(body) = failure.body_text() {
        if let Ok(api) = serde_json::from_str::<ApiErrorBody>(body) {
            return DrupalError::new(api.code, api.error);
        }
    }

    DrupalError::transport_failure(transport, failure.message().unwrap_or_default())
}
