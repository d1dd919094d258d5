//! Content-addressed response cache with optional LRU bound, TTL and file backing.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SleuthError;

const CACHE_FILE_VERSION: u32 = 2;

/// Shared handle to a response cache.
///
/// Clones share the same store. Keys are content hashes, so concurrent writers
/// racing on one key store the same value and last-writer-wins is harmless.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<RwLock<CacheInner>>,
    stats: Arc<CacheCounters>,
    path: Option<PathBuf>,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    max_entries: Option<usize>,
    ttl: Option<Duration>,
}

struct CacheEntry {
    value: String,
    stored_at: DateTime<Utc>,
    inserted_at: Instant,
    last_accessed: Instant,
}

#[derive(Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    saved_at: DateTime<Utc>,
    entries: BTreeMap<String, StoredEntry>,
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    stored_at: DateTime<Utc>,
}

impl ResponseCache {
    /// In-memory cache. `max_entries` of `None` means unbounded.
    pub fn new(max_entries: Option<usize>, ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                entries: HashMap::new(),
                max_entries,
                ttl,
            })),
            stats: Arc::new(CacheCounters::default()),
            path: None,
        }
    }

    /// Unbounded in-memory cache without expiry.
    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    /// Open a file-backed cache, loading existing entries if the file exists.
    ///
    /// Entries keep the age they had when written, so a TTL keeps counting
    /// across restarts and entries already past it are dropped.
    pub fn open(
        path: impl Into<PathBuf>,
        max_entries: Option<usize>,
        ttl: Option<Duration>,
    ) -> Result<Self, SleuthError> {
        let path = path.into();
        let mut cache = Self::new(max_entries, ttl);

        match fs::read_to_string(&path) {
            Ok(raw) => {
                let file: CacheFile = serde_json::from_str(&raw)?;
                if file.version != CACHE_FILE_VERSION {
                    return Err(SleuthError::Configuration(format!(
                        "unsupported cache file version {} in {}",
                        file.version,
                        path.display()
                    )));
                }
                tracing::debug!(
                    path = %path.display(),
                    entries = file.entries.len(),
                    saved_at = %file.saved_at,
                    "Loaded response cache"
                );
                let now = Utc::now();
                let ttl = cache.read().ttl;
                for (key, entry) in file.entries {
                    let age = (now - entry.stored_at).to_std().unwrap_or_default();
                    if ttl.is_some_and(|ttl| age > ttl) {
                        continue;
                    }
                    cache.store(key, entry.value, entry.stored_at, age);
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        cache.path = Some(path);
        Ok(cache)
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write all live entries to the backing file. No-op for in-memory caches.
    pub fn flush(&self) -> Result<(), SleuthError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let entries: BTreeMap<String, StoredEntry> = {
            let inner = self.read();
            inner
                .entries
                .iter()
                .filter(|(_, e)| !inner.is_expired(e))
                .map(|(k, e)| {
                    (
                        k.clone(),
                        StoredEntry {
                            value: e.value.clone(),
                            stored_at: e.stored_at,
                        },
                    )
                })
                .collect()
        };
        let file = CacheFile {
            version: CACHE_FILE_VERSION,
            saved_at: Utc::now(),
            entries,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&file)?)?;
        fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), entries = file.entries.len(), "Flushed response cache");
        Ok(())
    }

    /// Get a cached value by key, returning None if expired or missing.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.write();

        let expired = inner.entries.get(key).map(|e| inner.is_expired(e));
        let value = match expired {
            Some(true) => {
                inner.entries.remove(key);
                None
            }
            Some(false) => inner.entries.get_mut(key).map(|entry| {
                entry.last_accessed = Instant::now();
                entry.value.clone()
            }),
            None => None,
        };

        let counter = if value.is_some() {
            &self.stats.hits
        } else {
            &self.stats.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Insert or overwrite a value, evicting the least recently used entry at capacity.
    pub fn insert(&self, key: String, value: String) {
        self.store(key, value, Utc::now(), Duration::ZERO);
    }

    /// Insert an entry that is already `age` old.
    fn store(&self, key: String, value: String, stored_at: DateTime<Utc>, age: Duration) {
        let mut inner = self.write();

        if inner.ttl.is_some() {
            let ttl = inner.ttl;
            inner
                .entries
                .retain(|_, e| ttl.map_or(true, |ttl| e.inserted_at.elapsed() <= ttl));
        }

        if let Some(max) = inner.max_entries {
            if !inner.entries.contains_key(&key) && inner.entries.len() >= max {
                if let Some(lru_key) = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_accessed)
                    .map(|(k, _)| k.clone())
                {
                    inner.entries.remove(&lru_key);
                }
            }
        }

        let now = Instant::now();
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at,
                inserted_at: now.checked_sub(age).unwrap_or(now),
                last_accessed: now,
            },
        );
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.write().entries.clear();
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheInner {
    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .map_or(false, |ttl| entry.inserted_at.elapsed() > ttl)
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("path", &self.path)
            .field("stats", &self.stats())
            .finish()
    }
}
