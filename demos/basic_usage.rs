//! Basic usage example of the job-result cache.

use chrono::{Duration, Utc};
use jobcache::fingerprint::canonical_params;
use jobcache::store::{InMemoryBlobStore, InMemoryRecordStore};
use jobcache::{error::Result, JobCache, JobCacheConfig, JobDraft};
use serde_json::json;

fn visibility_draft(parameters: String, result: String) -> JobDraft {
    let now = Utc::now();
    JobDraft {
        identity: "alice".to_string(),
        request_type: "visibility".to_string(),
        api_version: "v1".to_string(),
        began_at: now - Duration::seconds(2),
        created_at: now,
        expires_at: now + Duration::hours(24),
        parameters,
        result,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== jobcache - Basic Example ===\n");

    // 1. Build the cache over the two in-memory stores
    println!("1. Initializing record and blob stores...");
    let config = JobCacheConfig::default().with_inline_limit(1_000);
    let cache = JobCache::with_config(
        InMemoryRecordStore::new(),
        InMemoryBlobStore::new(),
        config,
    )?;
    println!("   ✓ Cache ready\n");

    // 2. First request - nothing cached yet
    println!("2. Checking for a prior identical request:");
    let params = canonical_params(&json!({"ra": 10.0, "dec": 20.0}))?;
    let hit = cache
        .get_by_request(&params, "alice", "visibility", "v1")
        .await?;
    println!("   ✓ Lookup returned: {:?}\n", hit.is_some());

    // 3. Record the computed outcome
    println!("3. Saving a small result:");
    let receipt = cache
        .save(visibility_draft(params.clone(), r#"{"visible":true}"#.to_string()))
        .await?;
    println!(
        "   ✓ Saved under {} (offloaded: {})\n",
        receipt.fingerprint, receipt.offloaded
    );

    // 4. Same request again - cache hit
    println!("4. Repeating the identical request:");
    let record = cache
        .get_by_request(&params, "alice", "visibility", "v1")
        .await?
        .expect("record should be cached now");
    println!("   ✓ Cached result: {:?}\n", record.result.as_inline());

    // 5. A large result is offloaded transparently
    println!("5. Saving an oversized result:");
    let big_params = canonical_params(&json!({"ra": 187.3, "dec": -60.5}))?;
    let big_result = "x".repeat(5_000);
    let receipt = cache
        .save(visibility_draft(big_params.clone(), big_result.clone()))
        .await?;
    println!(
        "   ✓ Saved under {} (offloaded: {})",
        receipt.fingerprint, receipt.offloaded
    );

    let record = cache
        .get_by_request(&big_params, "alice", "visibility", "v1")
        .await?
        .expect("record should be cached now");
    println!(
        "   ✓ Read back {} bytes, identical: {}\n",
        record.result.as_inline().map(str::len).unwrap_or(0),
        record.result.as_inline() == Some(big_result.as_str())
    );

    println!("=== Done ===\n");
    Ok(())
}
