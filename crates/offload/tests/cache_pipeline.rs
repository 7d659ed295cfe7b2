//! End-to-end tests across the store, loader and worker pool

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use offload::loader::{LoadStatus, ResourceLoader, ResourceOptions};
use offload::persistence::{ResourceStore, SqliteEngine, StorageEngine};
use offload::reliability::RetryPolicy;
use offload::transform::{generate_key, AesGcm, Zstd};
use offload::worker::{sha256_hex, TaskKind, TokioSpawner, WorkerPool, WorkerPoolConfig};
use offload::{CacheRecord, Freshness};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Report {
    title: String,
    rows: Vec<u32>,
}

fn sample_report() -> Report {
    Report {
        title: "quarterly".to_string(),
        rows: vec![10, 20, 30],
    }
}

#[test_log::test(tokio::test)]
async fn sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cache.db");

    {
        let engine = SqliteEngine::open(&db_path).await.unwrap();
        let store = ResourceStore::new(Arc::new(engine.clone()));
        store.set("report", &sample_report()).await.unwrap();
        engine.close().await;
    }

    let engine = SqliteEngine::open(&db_path).await.unwrap();
    let store = ResourceStore::new(Arc::new(engine));
    let restored: Report = store.get("report").await.unwrap().unwrap();
    assert_eq!(restored, sample_report());
}

#[test_log::test(tokio::test)]
async fn sqlite_round_trip_with_full_transform_chain() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cache.db");
    let key = generate_key();

    let engine = SqliteEngine::open(&db_path).await.unwrap();
    let store = ResourceStore::new(Arc::new(engine))
        .with_transform(Zstd::default())
        .with_transform(AesGcm::from_base64_key(&key).unwrap());

    store.set("sealed", &sample_report()).await.unwrap();

    // The persisted bytes are neither JSON nor a bare zstd frame
    let entry = store.entry("sealed").await.unwrap().unwrap();
    assert!(serde_json::from_slice::<Report>(&entry.value).is_err());

    let restored: Report = store.get("sealed").await.unwrap().unwrap();
    assert_eq!(restored, sample_report());
}

#[test_log::test(tokio::test)]
async fn sqlite_round_trip_with_each_single_transform() {
    let dir = tempfile::tempdir().unwrap();

    let engine = SqliteEngine::open(dir.path().join("zstd.db")).await.unwrap();
    let store = ResourceStore::new(Arc::new(engine)).with_transform(Zstd::default());
    store.set("compressed", &sample_report()).await.unwrap();
    let restored: Report = store.get("compressed").await.unwrap().unwrap();
    assert_eq!(restored, sample_report());

    let engine = SqliteEngine::open(dir.path().join("aes.db")).await.unwrap();
    let store = ResourceStore::new(Arc::new(engine))
        .with_transform(AesGcm::from_base64_key(&generate_key()).unwrap());
    store.set("sealed", &sample_report()).await.unwrap();
    let restored: Report = store.get("sealed").await.unwrap().unwrap();
    assert_eq!(restored, sample_report());
}

#[test_log::test(tokio::test(start_paused = true))]
async fn loader_backoff_schedule_and_cached_record() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(SqliteEngine::open(dir.path().join("cache.db")).await.unwrap());
    let store = ResourceStore::new(engine.clone());

    let options = ResourceOptions::default()
        .with_stale_time(Duration::from_secs(60))
        .with_gc_time(Duration::from_secs(300))
        .with_retry(RetryPolicy::exponential().with_max_attempts(3));
    let loader = ResourceLoader::new(store.clone(), options);

    let calls = Arc::new(AtomicU32::new(0));
    let started = tokio::time::Instant::now();
    let wall_before = chrono::Utc::now().timestamp_millis();

    let counter = calls.clone();
    let report = loader
        .load(move || {
            let calls = counter.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    anyhow::bail!("upstream flaked");
                }
                Ok(sample_report())
            }
        })
        .await
        .unwrap();

    assert_eq!(report, sample_report());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Backoff schedule: 2s after the first failure, 4s after the second
    assert_eq!(started.elapsed(), Duration::from_secs(6));
    assert_eq!(loader.status(), LoadStatus::Success);

    // Exactly one record was written, tagged with the configured windows
    let wall_after = chrono::Utc::now().timestamp_millis();
    let keys = collect_keys(engine.as_ref(), wall_before, wall_after).await;
    assert_eq!(keys.len(), 1);
    let record: CacheRecord<Report> = store.get(&keys[0]).await.unwrap().unwrap();
    assert_eq!(record.data, sample_report());
    assert_eq!(record.stale_time, Duration::from_secs(60));
    assert_eq!(record.gc_time, Duration::from_secs(300));
    assert_eq!(record.freshness(record.timestamp), Freshness::Fresh);
}

#[test_log::test(tokio::test)]
async fn loader_zero_budget_never_touches_store() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(SqliteEngine::open(dir.path().join("cache.db")).await.unwrap());
    let loader = ResourceLoader::new(
        ResourceStore::new(engine.clone()),
        ResourceOptions::default().with_retry(RetryPolicy::no_retry()),
    );

    let calls = Arc::new(AtomicU32::new(0));
    let wall_before = chrono::Utc::now().timestamp_millis();
    let counter = calls.clone();
    let err = loader
        .load(move || {
            let calls = counter.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(sample_report())
            }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(err.attempts, 0);
    let wall_after = chrono::Utc::now().timestamp_millis();
    assert!(collect_keys(engine.as_ref(), wall_before, wall_after)
        .await
        .is_empty());
}

#[test_log::test(tokio::test)]
async fn pool_digest_matches_local_hash() {
    let pool = WorkerPool::new(
        &TokioSpawner::new(),
        WorkerPoolConfig::default().with_max_workers(2),
    );

    let body = serde_json::to_string(&sample_report()).unwrap();
    let digest = pool
        .run(TaskKind::ComputeHash, json!(body.clone()))
        .await
        .unwrap();

    assert_eq!(digest, json!(sha256_hex(&body)));
    pool.terminate();
    assert_eq!(pool.unit_count(), 0);
}

#[test_log::test(tokio::test)]
async fn loaded_resource_flows_through_the_pool() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(SqliteEngine::open(dir.path().join("cache.db")).await.unwrap());
    let store = ResourceStore::new(engine.clone()).with_transform(Zstd::default());
    let loader = ResourceLoader::new(store.clone(), ResourceOptions::default());

    let wall_before = chrono::Utc::now().timestamp_millis();
    let report = loader
        .load(|| async { Ok(sample_report()) })
        .await
        .unwrap();
    let wall_after = chrono::Utc::now().timestamp_millis();

    let pool = WorkerPool::new(
        &TokioSpawner::new(),
        WorkerPoolConfig::default().with_max_workers(2),
    );
    let digest = pool
        .run(TaskKind::ComputeHash, json!(report.title.clone()))
        .await
        .unwrap();

    assert_eq!(digest, json!(sha256_hex("quarterly")));

    // The cached record round-trips through the compressed store
    let keys = collect_keys(engine.as_ref(), wall_before, wall_after).await;
    assert_eq!(keys.len(), 1);
    let record: CacheRecord<Report> = store.get(&keys[0]).await.unwrap().unwrap();
    assert_eq!(record.data, report);

    pool.terminate();
}

/// List every key in `[from_ms, to_ms]` by probing the engine directly
///
/// Cache keys are millisecond write timestamps, so a test can bracket the
/// load with two clock reads and enumerate the window instead of adding a
/// list operation the store does not need.
async fn collect_keys(engine: &SqliteEngine, from_ms: i64, to_ms: i64) -> Vec<String> {
    let mut keys = Vec::new();
    for stamp in from_ms..=to_ms {
        let key = stamp.to_string();
        if engine.get(&key).await.unwrap().is_some() {
            keys.push(key);
        }
    }
    keys
}
