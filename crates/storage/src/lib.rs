//! Drupal Connect durable storage adapters.
//!
//! Implements [`connector::StorageAdapter`] over the local file system so
//! session state (e.g. saved credentials) outlives a single process. The
//! in-memory default lives in [`connector::MemoryStorage`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** File formats and write strategy live here; callers
//! only see the four-operation storage contract.

pub mod error;
pub mod file;

pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
