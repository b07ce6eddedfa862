//! Fingerprint derivation and canonical parameter serialization.
//!
//! The fingerprint is the cache key: a deterministic SHA-256 digest of a
//! request's identity-relevant fields, rendered as lowercase hex. The same
//! string doubles as the blob-store object key, so it must stay fixed-length
//! and URL-safe.
//!
//! Determinism is only as good as the `parameters` string fed in. Two
//! logically identical requests serialized with different key order or number
//! formatting would miss each other's cache entries, so structured parameters
//! go through [`canonical_params`] (RFC 8785 JSON Canonicalization Scheme)
//! before fingerprinting.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};

/// Compute the cache fingerprint for a request.
///
/// Concatenates the four inputs in fixed order and hashes them with SHA-256.
/// Pure and total: never fails, identical inputs always yield identical
/// output.
///
/// # Example
///
/// ```
/// use jobcache::fingerprint::fingerprint;
///
/// let a = fingerprint(r#"{"dec":20.0,"ra":10.0}"#, "alice", "visibility", "v1");
/// let b = fingerprint(r#"{"dec":20.0,"ra":10.0}"#, "alice", "visibility", "v1");
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn fingerprint(
    parameters: &str,
    identity: &str,
    request_type: &str,
    api_version: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parameters.as_bytes());
    hasher.update(identity.as_bytes());
    hasher.update(request_type.as_bytes());
    hasher.update(api_version.as_bytes());
    hex::encode(hasher.finalize())
}

/// Render parameters in canonical form (RFC 8785 JCS).
///
/// Object keys are sorted and number formatting is normalized, so two
/// logically identical parameter sets always produce the same string, and
/// therefore the same fingerprint.
///
/// # Example
///
/// ```
/// use jobcache::fingerprint::canonical_params;
/// use serde_json::json;
///
/// # fn main() -> jobcache::Result<()> {
/// let a = canonical_params(&json!({"ra": 10.0, "dec": 20.0}))?;
/// let b = canonical_params(&json!({"dec": 20.0, "ra": 10.0}))?;
/// assert_eq!(a, b);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns `Error::SerializationError` if the value cannot be rendered
/// (e.g. a non-finite float).
pub fn canonical_params(params: &serde_json::Value) -> Result<String> {
    serde_json_canonicalizer::to_string(params)
        .map_err(|e| Error::SerializationError(format!("canonical parameter form: {}", e)))
}
