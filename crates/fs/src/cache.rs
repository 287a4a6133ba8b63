//! In-process file content cache.
//!
//! Size- and TTL-bounded, keyed by absolute path, self-tuning to host
//! memory pressure through the adaptive controller. An entry is valid only
//! while its recorded size matches the file's current on-disk size.
//!
//! The cache never raises errors to callers; every failure path degrades
//! to "not cached" or silent eviction.

use crate::adaptive::{AdaptiveController, AdaptiveSettings};
use crate::probe::ResourceProbe;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Caching is refused for content larger than half the adaptive limit
/// while pressure exceeds this.
const LARGE_CONTENT_PRESSURE: f64 = 0.6;

/// How often the maintenance task runs.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(120);

struct CacheEntry {
    content: String,
    size: u64,
    modified: DateTime<Utc>,
    /// Refreshed on every hit; TTL and the eviction score age off this.
    last_access: Instant,
    access_count: u64,
}

impl CacheEntry {
    /// Eviction score: frequently used entries survive, stale ones go
    /// first. Age is measured in minutes since the last access.
    fn score(&self, now: Instant) -> f64 {
        let age_minutes = now.duration_since(self.last_access).as_secs_f64() / 60.0;
        0.7 * self.access_count as f64 - 0.3 * age_minutes
    }
}

struct CacheInner {
    /// Insertion order doubles as eviction order: hits re-insert at the
    /// back, so the front is always the least-recently refreshed entry.
    entries: IndexMap<PathBuf, CacheEntry>,
    controller: AdaptiveController,
}

/// The file content cache.
pub struct FileCache {
    probe: Arc<dyn ResourceProbe>,
    inner: Mutex<CacheInner>,
}

impl FileCache {
    pub fn new(probe: Arc<dyn ResourceProbe>) -> Self {
        let controller = AdaptiveController::new(probe.clone());
        Self {
            probe,
            inner: Mutex::new(CacheInner {
                entries: IndexMap::new(),
                controller,
            }),
        }
    }

    /// A snapshot of the current adaptive settings.
    pub async fn settings(&self) -> AdaptiveSettings {
        self.inner.lock().await.controller.settings()
    }

    /// Current memory pressure.
    pub fn pressure(&self) -> f64 {
        self.probe.pressure()
    }

    /// Look up a cached read. Returns the content only if an entry exists,
    /// its TTL has not expired, and its recorded size equals
    /// `current_size`; otherwise the stale entry is dropped. A hit bumps
    /// the access count, refreshes recency, and re-inserts the entry at
    /// the most-recently-used position.
    pub async fn get(
        &self,
        path: &Path,
        current_size: u64,
        current_modified: DateTime<Utc>,
    ) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let ttl = inner.controller.settings().cache_ttl;

        let mut entry = inner.entries.shift_remove(path)?;
        if entry.last_access.elapsed() > ttl || entry.size != current_size {
            trace!(path = %path.display(), "Dropping stale cache entry");
            return None;
        }

        entry.access_count += 1;
        entry.last_access = Instant::now();
        entry.modified = current_modified;
        let content = entry.content.clone();
        inner.entries.insert(path.to_path_buf(), entry);
        Some(content)
    }

    /// Insert a read result. Under high memory pressure this first runs an
    /// emergency eviction, and refuses outsized content entirely; at
    /// capacity, the oldest-inserted entries are evicted to make room.
    pub async fn set(&self, path: &Path, content: String, size: u64, modified: DateTime<Utc>) {
        let pressure = self.probe.pressure();
        let mut inner = self.inner.lock().await;
        let settings = inner.controller.settings();

        if pressure > settings.pressure_threshold {
            Self::emergency_evict(&mut inner.entries, settings.cache_capacity);
        }

        if pressure > LARGE_CONTENT_PRESSURE && content.len() as u64 > settings.max_file_size / 2 {
            trace!(
                path = %path.display(),
                pressure,
                "Refusing to cache large content under memory pressure"
            );
            return;
        }

        while inner.entries.len() >= settings.cache_capacity {
            inner.entries.shift_remove_index(0);
        }

        inner.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                content,
                size,
                modified,
                last_access: Instant::now(),
                access_count: 0,
            },
        );
    }

    /// Explicit invalidation, used after writes.
    pub async fn remove(&self, path: &Path) {
        self.inner.lock().await.entries.shift_remove(path);
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.inner.lock().await.entries.clear();
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    /// Purge TTL-expired entries and re-evaluate the adaptive settings.
    /// Called by the maintenance task; safe to call directly.
    pub async fn run_maintenance(&self) {
        let mut inner = self.inner.lock().await;
        let ttl = inner.controller.settings().cache_ttl;
        let before = inner.entries.len();
        inner.entries.retain(|_, e| e.last_access.elapsed() <= ttl);
        let purged = before - inner.entries.len();
        if purged > 0 {
            debug!(purged, "Purged expired cache entries");
        }
        inner.controller.refresh();
    }

    /// Evict the lowest-scoring entries until the cache holds at most
    /// half its capacity.
    fn emergency_evict(entries: &mut IndexMap<PathBuf, CacheEntry>, capacity: usize) {
        let target = capacity / 2;
        if entries.len() <= target {
            return;
        }
        let now = Instant::now();
        let mut scored: Vec<(PathBuf, f64)> = entries
            .iter()
            .map(|(path, entry)| (path.clone(), entry.score(now)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let evict = entries.len() - target;
        for (path, _) in scored.into_iter().take(evict) {
            entries.shift_remove(&path);
        }
        debug!(evicted = evict, "Emergency cache eviction");
    }

    /// Spawn the periodic maintenance task. The returned handle aborts the
    /// task when dropped; nothing persists past shutdown.
    pub fn spawn_maintenance(self: &Arc<Self>) -> MaintenanceHandle {
        let cache = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(MAINTENANCE_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.run_maintenance().await;
            }
        });
        MaintenanceHandle(handle)
    }
}

/// Owns the background maintenance task; aborts it on drop.
pub struct MaintenanceHandle(tokio::task::JoinHandle<()>);

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}
