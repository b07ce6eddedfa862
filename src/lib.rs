//! # jobcache
//!
//! A content-addressed job-result cache with pluggable record and blob stores.
//!
//! ## Features
//!
//! - **Content Addressed:** Records are keyed by a deterministic SHA-256
//!   fingerprint of (parameters, identity, request type, API version)
//! - **Store Agnostic:** Record and blob storage behind minimal async traits;
//!   in-memory implementations included, DynamoDB/S3-style stores plug in
//! - **Transparent Offload:** Results above a configurable size are moved to
//!   the blob store and resolved back on read, invisible to the caller
//! - **No Globals:** Both store handles are injected at construction;
//!   the cache holds no process-wide state
//! - **Production Ready:** Built-in logging, metrics hooks, and error handling
//!
//! ## Quick Start
//!
//! ```ignore
//! use jobcache::{
//!     JobCache, JobDraft,
//!     store::{InMemoryRecordStore, InMemoryBlobStore},
//! };
//! use chrono::{Duration, Utc};
//!
//! // 1. Create the cache over the two stores
//! let cache = JobCache::new(InMemoryRecordStore::new(), InMemoryBlobStore::new());
//!
//! // 2. Record an outcome
//! let now = Utc::now();
//! let draft = JobDraft {
//!     identity: "alice".to_string(),
//!     request_type: "visibility".to_string(),
//!     api_version: "v1".to_string(),
//!     began_at: now,
//!     created_at: now,
//!     expires_at: now + Duration::hours(24),
//!     parameters: r#"{"dec":20.0,"ra":10.0}"#.to_string(),
//!     result: r#"{"status":"ok"}"#.to_string(),
//! };
//! let receipt = cache.save(draft).await?;
//!
//! // 3. Look it up again from the same request inputs
//! let hit = cache
//!     .get_by_request(r#"{"dec":20.0,"ra":10.0}"#, "alice", "visibility", "v1")
//!     .await?;
//! assert!(hit.is_some());
//! ```

#[macro_use]
extern crate log;

pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod observability;
pub mod record;
pub mod serialization;
pub mod store;

// Re-exports for convenience
pub use cache::{JobCache, JobCacheConfig, SaveReceipt};
pub use error::{Error, Result, StoreKind};
pub use fingerprint::{canonical_params, fingerprint};
pub use record::{BlobRef, JobDraft, JobRecord, JobResult};
pub use store::{BlobStore, PutAck, RecordStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
