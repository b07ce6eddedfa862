//! Error types for the job cache.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which external store an operation was talking to when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// The structured key-value store holding job records.
    Record,
    /// The large-object store holding offloaded results.
    Blob,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Record => write!(f, "record store"),
            StoreKind::Blob => write!(f, "blob store"),
        }
    }
}

/// Error types for the job cache.
///
/// All cache operations return `Result<T>` where `Result` is defined as
/// `std::result::Result<T, Error>`.
///
/// A cache miss is NOT an error: lookup methods return `Ok(None)` for an
/// absent fingerprint. Errors are reserved for faults: a store failing,
/// or data that cannot be serialized or deserialized.
#[derive(Debug, Clone)]
pub enum Error {
    /// Serialization failed when converting a record or its parameters
    /// to canonical string form.
    ///
    /// Raised before anything is written, so a failing record never
    /// reaches the store.
    SerializationError(String),

    /// Deserialization failed when converting stored fields back into a
    /// record.
    ///
    /// This indicates corrupted or malformed data in the record store.
    ///
    /// **Recovery:** The entry should be overwritten by a fresh save.
    DeserializationError(String),

    /// One of the two external stores failed (network, throttling,
    /// permission).
    ///
    /// Carries the store identity and the operation that was in flight.
    /// The cache never retries internally; retry policy, if any, belongs
    /// to the adapter or the caller.
    Store {
        /// Which store failed.
        store: StoreKind,
        /// The operation in flight ("put", "get", ...).
        operation: String,
        /// The underlying failure, unmodified.
        message: String,
    },

    /// Configuration error during construction.
    ///
    /// Raised when a `JobCacheConfig` value is unusable, e.g. an empty
    /// bucket name.
    ConfigError(String),

    /// Generic error with custom message.
    ///
    /// Used for errors that don't fit into other variants.
    Other(String),
}

impl Error {
    /// Build a `Store` error with context attached.
    pub fn store(store: StoreKind, operation: &str, message: impl Into<String>) -> Self {
        Error::Store {
            store,
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::Store {
                store,
                operation,
                message,
            } => {
                write!(f, "{} {} failed: {}", store, operation, message)
            }
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::Other(e.to_string())
        } else if e.is_syntax() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
