//! Drupal Connect transport adapters.
//!
//! Implements the [`connector::TransportAdapter`] and
//! [`connector::NativeTransport`] traits over three distinct HTTP
//! mechanisms. Callers never branch on which one is installed: every
//! adapter prepares requests through [`connector::prepare_request`] and
//! reduces its native failures through [`connector::normalize_failure`].
//!
//! | Adapter | Native mechanism | Failure shape |
//! |---------|------------------|---------------|
//! | [`ReqwestTransport`] | `reqwest::Client` | message + optional response |
//! | [`FetchTransport`] | any [`Fetch`] (default [`DefaultFetch`]) | settled response with `ok`, or rejection |
//! | [`HyperTransport`] | `hyper-util` legacy client over `hyper-rustls` | completed exchange, or I/O error |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP client details live here; the [`connector`]
//! crate sees only the traits it defines.

mod state;

pub mod fetch;
pub mod hyper_adapter;
pub mod reqwest_adapter;

use std::str::FromStr;
use std::sync::Arc;

use connector::TransportAdapter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fetch::{DefaultFetch, Fetch, FetchError, FetchFailure, FetchResponse, FetchTransport};
pub use hyper_adapter::{default_hyper_client, HyperClient, HyperFailure, HyperTransport};
pub use reqwest_adapter::{ReqwestFailure, ReqwestTransport, ResponseData};

/// Selects one of the bundled transport adapters by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Reqwest,
    Fetch,
    Hyper,
}

impl TransportKind {
    pub const ALL: [TransportKind; 3] = [Self::Reqwest, Self::Fetch, Self::Hyper];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reqwest => "reqwest",
            Self::Fetch => "fetch",
            Self::Hyper => "hyper",
        }
    }

    /// Builds the adapter with its default client.
    pub fn build(self, base_url: Option<&str>) -> Arc<dyn TransportAdapter> {
        match (self, base_url) {
            (Self::Reqwest, Some(url)) => Arc::new(ReqwestTransport::new().with_base_url(url)),
            (Self::Reqwest, None) => Arc::new(ReqwestTransport::new()),
            (Self::Fetch, Some(url)) => Arc::new(FetchTransport::new().with_base_url(url)),
            (Self::Fetch, None) => Arc::new(FetchTransport::new()),
            (Self::Hyper, Some(url)) => Arc::new(HyperTransport::new().with_base_url(url)),
            (Self::Hyper, None) => Arc::new(HyperTransport::new()),
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown transport name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transport '{0}' (expected reqwest, fetch, or hyper)")]
pub struct UnknownTransport(pub String);

impl FromStr for TransportKind {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownTransport(s.to_owned()))
    }
}
