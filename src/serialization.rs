//! Store-boundary conversion between records and their wire rows.
//!
//! The record store holds every field as a string: timestamps in RFC 3339,
//! and the result collapsed into a single column where an offloaded payload
//! is marked by the reserved `s3://<bucket>/<fingerprint>` prefix. This
//! module is the ONLY place that collapse and its inverse exist; everywhere
//! else in the crate the result is the explicit [`JobResult`] type.
//!
//! # Known limitation
//!
//! The collapsed form is ambiguous by construction: a literal result that
//! happens to begin with `s3://<bucket>/<key>` is indistinguishable from a
//! reference and will be read back as one. See [`decode_result`]. Callers
//! whose literal output could legitimately start with the scheme marker must
//! wrap or escape it upstream.

use crate::error::{Error, Result};
use crate::record::{BlobRef, JobRecord, JobResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The wire row: a `JobRecord` with every field serialized to a string.
///
/// This is what the record store adapter puts and gets. Field names match
/// the table's attribute set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredJobRecord {
    pub fingerprint: String,
    pub identity: String,
    pub request_type: String,
    pub api_version: String,
    pub began_at: String,
    pub created_at: String,
    pub expires_at: String,
    pub parameters: String,
    pub result: String,
}

/// Collapse a [`JobResult`] into its stored string form.
pub fn encode_result(result: &JobResult) -> String {
    match result {
        JobResult::Inline(content) => content.clone(),
        JobResult::External(blob_ref) => blob_ref.to_string(),
    }
}

/// Expand a stored result string back into a [`JobResult`].
///
/// Any value beginning with the reserved scheme prefix and parsing as a
/// well-formed reference is treated as external; everything else is literal
/// content. A literal that happens to look like a reference is misread as
/// one. This is the documented ambiguity of the collapsed representation,
/// not something this function can repair.
pub fn decode_result(stored: &str) -> JobResult {
    match BlobRef::parse(stored) {
        Some(blob_ref) => JobResult::External(blob_ref),
        None => JobResult::Inline(stored.to_string()),
    }
}

/// Serialize a record into its all-string row.
///
/// Timestamps render as RFC 3339. Infallible in practice, but kept fallible
/// so the boundary can reject a record before any write if a field cannot be
/// represented.
pub fn encode_record(record: &JobRecord) -> Result<StoredJobRecord> {
    Ok(StoredJobRecord {
        fingerprint: record.fingerprint.clone(),
        identity: record.identity.clone(),
        request_type: record.request_type.clone(),
        api_version: record.api_version.clone(),
        began_at: record.began_at.to_rfc3339(),
        created_at: record.created_at.to_rfc3339(),
        expires_at: record.expires_at.to_rfc3339(),
        parameters: record.parameters.clone(),
        result: encode_result(&record.result),
    })
}

/// Deserialize a stored row back into a record.
///
/// # Errors
///
/// Returns `Error::DeserializationError` if a timestamp field is not valid
/// RFC 3339. The fetched row is left untouched in the store; the caller sees
/// the error instead of a partially-populated record.
pub fn decode_record(row: &StoredJobRecord) -> Result<JobRecord> {
    Ok(JobRecord {
        fingerprint: row.fingerprint.clone(),
        identity: row.identity.clone(),
        request_type: row.request_type.clone(),
        api_version: row.api_version.clone(),
        began_at: parse_timestamp("began_at", &row.began_at)?,
        created_at: parse_timestamp("created_at", &row.created_at)?,
        expires_at: parse_timestamp("expires_at", &row.expires_at)?,
        parameters: row.parameters.clone(),
        result: decode_result(&row.result),
    })
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::DeserializationError(format!("{} '{}': {}", field, value, e)))
}
