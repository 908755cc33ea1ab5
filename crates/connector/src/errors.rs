//! Canonical error and wiring-error types for the Drupal Connect core.
//!
//! [`DrupalError`] is the single normalized error every transport failure
//! converges to. It is an I/O outcome: callers handle it per call.
//!
//! [`ConnectorError`] covers wiring mistakes in the [`crate::ServiceCore`]
//! (a service slot read before anything was installed). It is a distinct
//! type so callers can tell "you forgot to wire a service" apart from "the
//! network or the API failed" without inspecting message text.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code reserved for transport-level failures: network errors, unparseable
/// error bodies, undecodable success bodies, and wrapped native messages.
pub const TRANSPORT_FAILURE_CODE: i64 = 100;

/// Result alias for operations that reach the remote API.
pub type DrupalResult<T> = Result<T, DrupalError>;

// ---------------------------------------------------------------------------
// Canonical error
// ---------------------------------------------------------------------------

/// Normalized error produced by every transport adapter.
///
/// Renders as `DrupalError: <code> <message>`. The code is either passed
/// through from a structured error body returned by the API, the reserved
/// [`TRANSPORT_FAILURE_CODE`], or any integer a caller chooses when
/// constructing one directly.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("DrupalError: {code} {message}")]
pub struct DrupalError {
    code: i64,
    message: String,
}

impl DrupalError {
    /// Creates a [`DrupalError`] with an explicit code.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Wraps a native transport message under [`TRANSPORT_FAILURE_CODE`].
    ///
    /// The message reads `<transport> method failed: "<detail>"`.
    pub fn transport_failure(transport: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            TRANSPORT_FAILURE_CODE,
            format!("{transport} method failed: \"{detail}\""),
        )
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if this error came from the transport rather than from
    /// a structured API error body.
    pub fn is_transport_failure(&self) -> bool {
        self.code == TRANSPORT_FAILURE_CODE
    }
}

// ---------------------------------------------------------------------------
// Wiring errors
// ---------------------------------------------------------------------------

/// Identifies one of the service slots held by [`crate::ServiceCore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// The HTTP transport slot.
    Transport,
    /// The session storage slot.
    Session,
    /// The configuration storage slot.
    Config,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "TransportService",
            Self::Session => "SessionService",
            Self::Config => "ConfigService",
        };
        f.write_str(name)
    }
}

/// Errors raised by the service registry itself.
///
/// These indicate a programming or wiring mistake, never a runtime I/O
/// condition; see [`DrupalError`] for the latter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    /// A service slot was read before any implementation was installed.
    #[error("{0} undefined")]
    ServiceUndefined(ServiceKind),
}
