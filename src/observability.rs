//! Observability hooks for cache operations.
//!
//! Implement the `CacheMetrics` trait to feed hits, misses, saves, and
//! offloads into your monitoring system:
//!
//! ```ignore
//! use jobcache::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _fingerprint: &str, _duration: Duration) {
//!         // counter!("jobcache_hits").inc();
//!     }
//!     // ... implement other methods
//! }
//!
//! // let cache = JobCache::new(records, blobs)
//! //     .with_metrics(Box::new(PrometheusMetrics));
//! ```
//!
//! Default behavior (if not overridden) logs via the `log` crate. A cache
//! miss is a normal outcome and is never recorded at error level.

use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, fingerprint: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", fingerprint, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, fingerprint: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", fingerprint, duration);
    }

    /// Record a completed save.
    fn record_save(&self, fingerprint: &str, duration: Duration) {
        debug!("Cache SAVE: {} took {:?}", fingerprint, duration);
    }

    /// Record a result offloaded to the blob store.
    fn record_offload(&self, fingerprint: &str, size: usize) {
        debug!("Cache OFFLOAD: {} ({} bytes)", fingerprint, size);
    }

    /// Record an error.
    fn record_error(&self, fingerprint: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", fingerprint, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _fingerprint: &str, _duration: Duration) {}
    fn record_miss(&self, _fingerprint: &str, _duration: Duration) {}
    fn record_save(&self, _fingerprint: &str, _duration: Duration) {}
    fn record_offload(&self, _fingerprint: &str, _size: usize) {}
    fn record_error(&self, _fingerprint: &str, _error: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_hit("fp", Duration::from_secs(1));
        metrics.record_miss("fp", Duration::from_secs(2));
        metrics.record_offload("fp", 500_000);
    }
}
