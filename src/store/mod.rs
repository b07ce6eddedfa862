//! Store adapter traits for the two external backends.
//!
//! The cache talks to a structured key-value store (job records) and a
//! large-object store (offloaded payloads) through these minimal interfaces.
//! Replication, durability, and indexing of the backends are not modeled
//! here; single-key atomic put/get is the only guarantee assumed.

use crate::error::Result;
use crate::serialization::StoredJobRecord;

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "inmemory")]
pub use inmemory::{InMemoryBlobStore, InMemoryRecordStore};

/// Write acknowledgment from the record store.
///
/// Opaque descriptor of a completed put; adapters may attach a backend
/// request identifier for tracing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutAck {
    /// Backend-assigned request/operation id, if the store provides one.
    pub request_id: Option<String>,
}

/// Trait for record store implementations.
///
/// One table keyed by fingerprint, every attribute a string. Implementations:
/// DynamoDB-style key-value services, SQL rows, in-memory (default).
///
/// **IMPORTANT:** All methods use `&self` to allow concurrent access.
/// Implementations should use interior mutability or an external connection
/// pool, and should propagate a caller-supplied deadline where the underlying
/// client supports one; the cache passes any resulting timeout through as a
/// store error without interpretation.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait RecordStore: Send + Sync + Clone {
    /// Write a record row under its key, overwriting any previous row.
    ///
    /// # Errors
    /// Returns `Err` if the store fails (connection lost, throttled, etc.)
    async fn put(&self, key: &str, row: StoredJobRecord) -> Result<PutAck>;

    /// Retrieve a record row by key.
    ///
    /// # Returns
    /// - `Ok(Some(row))` - Row found
    /// - `Ok(None)` - Key absent (normal miss, not an error)
    ///
    /// # Errors
    /// Returns `Err` if the store fails
    async fn get_by_key(&self, key: &str) -> Result<Option<StoredJobRecord>>;

    /// Health check - verify the store is accessible.
    ///
    /// Used for readiness probes, circuit breakers, etc.
    ///
    /// # Errors
    /// Returns `Err` if the store is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Idempotent deployment-time provisioning (table creation and the like).
    ///
    /// Invoked once at deployment, never on the runtime path. The default
    /// assumes the backing table already exists.
    ///
    /// # Errors
    /// Returns `Err` if provisioning fails
    async fn provision(&self) -> Result<()> {
        Ok(())
    }
}

/// Trait for blob store implementations.
///
/// One bucket/namespace; object key = fingerprint; body = the literal large
/// result. Payloads are opaque text; no versioning or multipart behavior is
/// required. Implementations: S3-style object stores, filesystem, in-memory
/// (default).
///
/// Same concurrency and cancellation expectations as [`RecordStore`].
#[allow(async_fn_in_trait)]
pub trait BlobStore: Send + Sync + Clone {
    /// Store a payload under a key with the given content type.
    ///
    /// # Errors
    /// Returns `Err` if the store fails
    async fn put(&self, key: &str, payload: String, content_type: &str) -> Result<()>;

    /// Retrieve a payload by key.
    ///
    /// # Returns
    /// - `Ok(Some(payload))` - Object found
    /// - `Ok(None)` - Key absent
    ///
    /// # Errors
    /// Returns `Err` if the store fails
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Health check - verify the store is accessible.
    ///
    /// # Errors
    /// Returns `Err` if the store is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Idempotent deployment-time provisioning (bucket creation and the like).
    ///
    /// # Errors
    /// Returns `Err` if provisioning fails
    async fn provision(&self) -> Result<()> {
        Ok(())
    }
}
