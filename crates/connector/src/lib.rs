//! Core connection and error-normalization substrate for Drupal Connect.
//!
//! This crate defines every port the client core needs (HTTP transport,
//! key-value storage), the single canonical error all transport failures
//! are reduced to, and the [`ServiceCore`] registry that wires concrete
//! implementations together. Infrastructure crates implement the traits
//! defined here; they never add rules of their own.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies. The
//! `transports` crate supplies HTTP mechanisms and the `storage` crate
//! supplies durable storage.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`errors`] | [`DrupalError`], [`ConnectorError`], the reserved failure code |
//! | [`values`] | [`StorageValue`] and the [`ConfigRecord`] alias |
//! | [`storage`] | [`StorageAdapter`] port and [`MemoryStorage`] |
//! | [`request`] | [`CallOptions`], [`prepare_request`], [`decode_body`] |
//! | [`transport`] | [`TransportAdapter`], [`NativeTransport`], [`normalize_failure`] |
//! | [`services`] | [`ServiceCore`] |

pub mod errors;
pub mod request;
pub mod services;
pub mod storage;
pub mod transport;
pub mod values;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ConnectorError, DrupalError, DrupalResult, ServiceKind, TRANSPORT_FAILURE_CODE};
pub use request::{
    decode_body, prepare_request, BasicAuth, CallOptions, Headers, PreparedRequest, RequestError,
};
pub use services::{ServiceCore, BASE_URL_KEY};
pub use storage::{MemoryStorage, StorageAdapter};
pub use transport::{
    normalize_failure, status_failure_message, NativeFailure, NativeTransport, TransportAdapter,
};
pub use values::{ConfigRecord, StorageValue};
