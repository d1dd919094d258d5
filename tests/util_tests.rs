use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use sleuth::error::SleuthError;
use sleuth::util::cache::ResponseCache;
use sleuth::util::retry::RetryPolicy;

#[test]
fn file_cache_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("responses.json");

    let cache = ResponseCache::open(&path, None, None).unwrap();
    cache.insert("a".into(), "alpha".into());
    cache.insert("b".into(), "beta".into());
    cache.flush().unwrap();

    let reopened = ResponseCache::open(&path, None, None).unwrap();

    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.get("a").as_deref(), Some("alpha"));
    assert_eq!(reopened.path(), Some(path.as_path()));
}

#[test]
fn missing_cache_file_opens_empty() {
    let dir = TempDir::new().unwrap();

    let cache = ResponseCache::open(dir.path().join("absent.json"), None, None).unwrap();

    assert!(cache.is_empty());
}

#[test]
fn corrupt_cache_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("responses.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        ResponseCache::open(&path, None, None),
        Err(SleuthError::Serialization(_))
    ));
}

#[test]
fn in_memory_flush_is_a_no_op() {
    let cache = ResponseCache::unbounded();
    cache.insert("k".into(), "v".into());

    cache.flush().unwrap();

    assert!(cache.path().is_none());
}

#[test]
fn least_recently_used_entry_is_evicted() {
    let cache = ResponseCache::new(Some(2), None);
    cache.insert("a".into(), "1".into());
    thread::sleep(Duration::from_millis(2));
    cache.insert("b".into(), "2".into());
    thread::sleep(Duration::from_millis(2));
    assert!(cache.get("a").is_some());
    thread::sleep(Duration::from_millis(2));

    cache.insert("c".into(), "3".into());

    assert_eq!(cache.len(), 2);
    assert!(cache.get("a").is_some());
    assert!(cache.get("b").is_none());
    assert!(cache.get("c").is_some());
}

#[test]
fn overwriting_at_capacity_does_not_evict() {
    let cache = ResponseCache::new(Some(1), None);
    cache.insert("a".into(), "1".into());

    cache.insert("a".into(), "2".into());

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("a").as_deref(), Some("2"));
}

#[test]
fn expired_entries_are_misses() {
    let cache = ResponseCache::new(None, Some(Duration::from_millis(20)));
    cache.insert("k".into(), "v".into());
    assert!(cache.get("k").is_some());

    thread::sleep(Duration::from_millis(60));

    assert!(cache.get("k").is_none());
    assert!(cache.is_empty());
}

#[test]
fn stats_count_hits_and_misses() {
    let cache = ResponseCache::unbounded();
    cache.insert("k".into(), "v".into());

    cache.get("k");
    cache.get("k");
    cache.get("missing");

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);

    cache.clear();
    assert_eq!(cache.stats().entries, 0);
}

#[test]
fn concurrent_writers_share_one_store() {
    let cache = ResponseCache::unbounded();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    cache.insert(format!("{worker}-{i}"), i.to_string());
                    cache.insert("shared".into(), "same".into());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 8 * 50 + 1);
    assert_eq!(cache.get("shared").as_deref(), Some("same"));
}

#[test]
fn default_policy_schedule() {
    let delays: Vec<u64> = RetryPolicy::default()
        .schedule()
        .map(|d| d.as_millis() as u64)
        .collect();

    assert_eq!(delays, vec![1500, 3000, 6000, 12000, 24000, 48000, 60000]);
}

#[test]
fn rate_limit_hint_is_capped() {
    let policy = RetryPolicy::default();

    let hinted = policy.delay_for(
        0,
        &SleuthError::RateLimited {
            retry_after_ms: Some(5_000),
        },
    );
    let huge = policy.delay_for(
        0,
        &SleuthError::RateLimited {
            retry_after_ms: Some(600_000),
        },
    );

    assert_eq!(hinted, Duration::from_secs(5));
    assert_eq!(huge, Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn zero_attempts_still_runs_once() {
    let policy = RetryPolicy {
        max_attempts: 0,
        ..RetryPolicy::default()
    };
    let mut calls = 0;

    let result: Result<(), SleuthError> = policy
        .execute(|| {
            calls += 1;
            async { Err(SleuthError::Timeout(1)) }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls, 1);
}

fn write_cache_file(path: &std::path::Path, entries: serde_json::Value) {
    let file = serde_json::json!({
        "version": 2,
        "saved_at": chrono::Utc::now(),
        "entries": entries,
    });
    std::fs::write(path, file.to_string()).unwrap();
}

#[test]
fn ttl_counts_from_when_an_entry_was_first_stored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("responses.json");
    let old = chrono::Utc::now() - chrono::Duration::hours(2);
    write_cache_file(
        &path,
        serde_json::json!({
            "stale": { "value": "old", "stored_at": old },
            "fresh": { "value": "new", "stored_at": chrono::Utc::now() },
        }),
    );

    let cache = ResponseCache::open(&path, None, Some(Duration::from_secs(3600))).unwrap();

    assert!(cache.get("stale").is_none());
    assert_eq!(cache.get("fresh").as_deref(), Some("new"));
    assert_eq!(cache.len(), 1);
}

#[test]
fn old_entries_survive_without_a_ttl() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("responses.json");
    let old = chrono::Utc::now() - chrono::Duration::days(30);
    write_cache_file(
        &path,
        serde_json::json!({ "k": { "value": "v", "stored_at": old } }),
    );

    let cache = ResponseCache::open(&path, None, None).unwrap();

    assert_eq!(cache.get("k").as_deref(), Some("v"));
}

#[test]
fn reopening_keeps_the_original_store_time() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("responses.json");
    let old = chrono::Utc::now() - chrono::Duration::minutes(50);
    write_cache_file(
        &path,
        serde_json::json!({ "k": { "value": "v", "stored_at": old } }),
    );

    let ttl = Some(Duration::from_secs(3600));
    ResponseCache::open(&path, None, ttl).unwrap().flush().unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let stored_at: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(raw["entries"]["k"]["stored_at"].clone()).unwrap();
    assert_eq!(stored_at, old);
}
