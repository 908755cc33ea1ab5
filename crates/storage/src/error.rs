use std::path::PathBuf;

/// Errors from durable storage backends.
///
/// These never cross the [`connector::StorageAdapter`] boundary, whose
/// operations report success as a `bool`; they surface from constructors
/// such as [`crate::FileStorage::open`] and in `tracing` output.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but does not hold a JSON object of values.
    #[error("corrupt storage file {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode storage contents: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result alias for storage backend operations.
pub type StorageResult<T> = Result<T, StorageError>;
