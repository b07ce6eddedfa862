//! Job record types.
//!
//! A [`JobRecord`] is one cached computation outcome, keyed by its derived
//! fingerprint. Callers never construct a `JobRecord` directly: they populate
//! a [`JobDraft`] (everything except the fingerprint) and hand it to
//! [`JobCache::save`](crate::JobCache::save), which computes the fingerprint
//! and finalizes the record. The split makes "the fingerprint is never chosen
//! by the caller" a compile-time fact rather than a convention.
//!
//! The result of a job is an explicit two-variant type, [`JobResult`]: either
//! the literal output, or a [`BlobRef`] pointing at an offloaded payload.
//! The stored form collapses both into one string field with a reserved
//! scheme prefix; that collapse lives in [`crate::serialization`], not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved scheme marker for offloaded results.
///
/// Any stored `result` value beginning with `s3://` is interpreted as a
/// reference to the blob store, never as literal content.
pub const BLOB_SCHEME: &str = "s3";

/// Reference to a result payload held in the blob store.
///
/// Rendered and parsed as `s3://<bucket>/<fingerprint>`. The fingerprint
/// doubles as the blob object key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    /// Bucket/namespace holding the payload.
    pub bucket: String,
    /// Object key; always the record's fingerprint.
    pub fingerprint: String,
}

impl BlobRef {
    pub fn new(bucket: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        BlobRef {
            bucket: bucket.into(),
            fingerprint: fingerprint.into(),
        }
    }

    /// Parse a reference string of the form `s3://<bucket>/<fingerprint>`.
    ///
    /// Returns `None` if the string does not carry the reserved scheme or is
    /// missing either component.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix(BLOB_SCHEME)?.strip_prefix("://")?;
        let (bucket, fingerprint) = rest.split_once('/')?;
        if bucket.is_empty() || fingerprint.is_empty() {
            return None;
        }
        Some(BlobRef::new(bucket, fingerprint))
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", BLOB_SCHEME, self.bucket, self.fingerprint)
    }
}

/// A job's result: literal output, or a reference to an offloaded payload.
///
/// Callers reading through [`JobCache`](crate::JobCache) always observe
/// `Inline`; the cache resolves `External` back into literal content on the
/// read path. `External` appears only between the storage decision in `save`
/// and the store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobResult {
    /// The literal computed output.
    Inline(String),
    /// The output lives in the blob store under the record's fingerprint.
    External(BlobRef),
}

impl JobResult {
    /// The literal content, if this result is inline.
    pub fn as_inline(&self) -> Option<&str> {
        match self {
            JobResult::Inline(s) => Some(s),
            JobResult::External(_) => None,
        }
    }

    /// The blob reference, if this result is offloaded.
    pub fn as_external(&self) -> Option<&BlobRef> {
        match self {
            JobResult::Inline(_) => None,
            JobResult::External(r) => Some(r),
        }
    }
}

/// One cached computation outcome.
///
/// Immutable from the cache's point of view once saved, except for being
/// overwritten by a new save with the same fingerprint (last writer wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Derived primary key: a deterministic function of `parameters`,
    /// `identity`, `request_type`, and `api_version`.
    pub fingerprint: String,
    /// The requesting principal.
    pub identity: String,
    /// Logical operation name.
    pub request_type: String,
    /// Schema/version tag; part of the fingerprint input so incompatible
    /// result shapes never collide.
    pub api_version: String,
    /// When the computation began.
    pub began_at: DateTime<Utc>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Advisory expiry. Stored and returned, never enforced here;
    /// enforcement belongs to a store-level TTL or an external sweeper.
    pub expires_at: DateTime<Utc>,
    /// Canonical string serialization of the request's input parameters.
    pub parameters: String,
    /// The job's result.
    pub result: JobResult,
}

/// A candidate record: everything except the fingerprint.
///
/// `result` is always the literal output here; the inline-vs-offload decision
/// happens inside [`JobCache::save`](crate::JobCache::save).
///
/// `parameters` must already be in canonical form; build it with
/// [`canonical_params`](crate::fingerprint::canonical_params) when starting
/// from structured data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDraft {
    pub identity: String,
    pub request_type: String,
    pub api_version: String,
    pub began_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub parameters: String,
    pub result: String,
}
