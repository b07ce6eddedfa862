//! In-memory store implementations (default, thread-safe, async).
//!
//! Both use DashMap for lock-free concurrent access with per-key sharding.
//! They stand in for the external key-value and blob services in tests,
//! demos, and embedded deployments.

use super::{BlobStore, PutAck, RecordStore};
use crate::error::Result;
use crate::serialization::StoredJobRecord;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe async in-memory record store.
///
/// # Example
///
/// ```no_run
/// use jobcache::store::{InMemoryRecordStore, RecordStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryRecordStore::new();
///     let row = store.get_by_key("some-fingerprint").await?;
///     assert!(row.is_none());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryRecordStore {
    rows: Arc<DashMap<String, StoredJobRecord>>,
}

impl InMemoryRecordStore {
    /// Create a new empty in-memory record store.
    pub fn new() -> Self {
        InMemoryRecordStore {
            rows: Arc::new(DashMap::new()),
        }
    }

    /// Get the current number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    async fn put(&self, key: &str, row: StoredJobRecord) -> Result<PutAck> {
        self.rows.insert(key.to_string(), row);
        debug!("✓ InMemory record PUT {}", key);
        Ok(PutAck::default())
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<StoredJobRecord>> {
        let row = self.rows.get(key).map(|entry| entry.clone());
        if row.is_some() {
            debug!("✓ InMemory record GET {} -> HIT", key);
        } else {
            debug!("✓ InMemory record GET {} -> MISS", key);
        }
        Ok(row)
    }
}

/// Thread-safe async in-memory blob store.
///
/// Content types are retained alongside payloads so tests can assert on
/// them; a real object store would surface them as object metadata.
#[derive(Clone)]
pub struct InMemoryBlobStore {
    objects: Arc<DashMap<String, BlobObject>>,
}

#[derive(Clone)]
struct BlobObject {
    payload: String,
    content_type: String,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory blob store.
    pub fn new() -> Self {
        InMemoryBlobStore {
            objects: Arc::new(DashMap::new()),
        }
    }

    /// Get the current number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The content type recorded for a key, if the object exists.
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.get(key).map(|entry| entry.content_type.clone())
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, payload: String, content_type: &str) -> Result<()> {
        let size = payload.len();
        self.objects.insert(
            key.to_string(),
            BlobObject {
                payload,
                content_type: content_type.to_string(),
            },
        );
        debug!("✓ InMemory blob PUT {} ({} bytes)", key, size);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let payload = self.objects.get(key).map(|entry| entry.payload.clone());
        if payload.is_some() {
            debug!("✓ InMemory blob GET {} -> HIT", key);
        } else {
            debug!("✓ InMemory blob GET {} -> MISS", key);
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(fingerprint: &str) -> StoredJobRecord {
        StoredJobRecord {
            fingerprint: fingerprint.to_string(),
            identity: "alice".to_string(),
            request_type: "visibility".to_string(),
            api_version: "v1".to_string(),
            began_at: "2024-06-01T12:00:00+00:00".to_string(),
            created_at: "2024-06-01T12:00:01+00:00".to_string(),
            expires_at: "2024-06-02T12:00:00+00:00".to_string(),
            parameters: r#"{"dec":20,"ra":10}"#.to_string(),
            result: "ok".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_store_put_get() {
        let store = InMemoryRecordStore::new();

        store
            .put("fp1", sample_row("fp1"))
            .await
            .expect("Failed to put");

        let row = store.get_by_key("fp1").await.expect("Failed to get");
        assert_eq!(row.map(|r| r.identity), Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_record_store_miss() {
        let store = InMemoryRecordStore::new();

        let row = store.get_by_key("nonexistent").await.expect("Failed to get");
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_record_store_last_writer_wins() {
        let store = InMemoryRecordStore::new();

        store
            .put("fp1", sample_row("fp1"))
            .await
            .expect("Failed to put");

        let mut second = sample_row("fp1");
        second.result = "newer".to_string();
        store.put("fp1", second).await.expect("Failed to put");

        let row = store.get_by_key("fp1").await.expect("Failed to get");
        assert_eq!(row.map(|r| r.result), Some("newer".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_blob_store_put_get() {
        let store = InMemoryBlobStore::new();

        store
            .put("fp1", "payload".to_string(), "application/json")
            .await
            .expect("Failed to put");

        let payload = store.get("fp1").await.expect("Failed to get");
        assert_eq!(payload, Some("payload".to_string()));
        assert_eq!(
            store.content_type("fp1"),
            Some("application/json".to_string())
        );
    }

    #[tokio::test]
    async fn test_blob_store_miss() {
        let store = InMemoryBlobStore::new();

        let payload = store.get("nonexistent").await.expect("Failed to get");
        assert!(payload.is_none());
    }

    #[tokio::test]
    async fn test_stores_shared_via_clone() {
        let store = InMemoryBlobStore::new();
        let clone = store.clone();

        store
            .put("fp1", "payload".to_string(), "text/plain")
            .await
            .expect("Failed to put");

        // Both handles see the same objects
        let payload = clone.get("fp1").await.expect("Failed to get");
        assert_eq!(payload, Some("payload".to_string()));
    }

    #[tokio::test]
    async fn test_record_store_concurrent_writers() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryRecordStore::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store_clone = Arc::clone(&store);
            let handle = tokio::spawn(async move {
                let key = format!("fp_{}", i);
                store_clone
                    .put(&key, sample_row(&key))
                    .await
                    .expect("Failed to put");
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(store.len(), 10);
    }
}
