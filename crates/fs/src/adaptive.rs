//! Adaptive settings derived from host memory.
//!
//! The settings gate how large a file may be cached, how many entries the
//! cache holds, how long they live, how big streaming chunks are, and at
//! what memory pressure eviction and streaming aborts trigger.
//!
//! The controller is an explicitly owned object with a `refresh()` method,
//! driven by the cache's maintenance task (or called directly in tests) —
//! there is no module-level singleton.

use crate::probe::ResourceProbe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

const GIB: u64 = 1024 * 1024 * 1024;
const MIB: u64 = 1024 * 1024;
const KIB: u64 = 1024;

/// Minimum interval between settings re-evaluations.
const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// New settings are only applied when pressure moved more than this.
const PRESSURE_DELTA: f64 = 0.10;

/// The knobs the file layer runs on. Snapshots are cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveSettings {
    /// Files above this size are streamed instead of cached.
    pub max_file_size: u64,

    /// Maximum number of cache entries.
    pub cache_capacity: usize,

    /// Entries unread for longer than this are purged.
    pub cache_ttl: Duration,

    /// Chunk size for streamed reads.
    pub chunk_size: usize,

    /// Memory-pressure fraction above which eviction and streaming
    /// aborts trigger.
    pub pressure_threshold: f64,
}

impl AdaptiveSettings {
    /// Compute settings from the current memory readings.
    pub fn from_probe(probe: &dyn ResourceProbe) -> Self {
        let total = probe.total_memory();
        if total >= 16 * GIB {
            Self {
                max_file_size: 10 * MIB,
                cache_capacity: 200,
                cache_ttl: Duration::from_secs(10 * 60),
                chunk_size: (256 * KIB) as usize,
                pressure_threshold: 0.85,
            }
        } else if total >= 8 * GIB {
            Self {
                max_file_size: 5 * MIB,
                cache_capacity: 100,
                cache_ttl: Duration::from_secs(5 * 60),
                chunk_size: (128 * KIB) as usize,
                pressure_threshold: 0.85,
            }
        } else {
            Self {
                max_file_size: 2 * MIB,
                cache_capacity: 50,
                cache_ttl: Duration::from_secs(3 * 60),
                chunk_size: (64 * KIB) as usize,
                pressure_threshold: 0.75,
            }
        }
    }
}

/// Owns the current settings and decides when to recompute them.
pub struct AdaptiveController {
    probe: Arc<dyn ResourceProbe>,
    settings: AdaptiveSettings,
    last_refresh: Instant,
    last_pressure: f64,
}

impl AdaptiveController {
    pub fn new(probe: Arc<dyn ResourceProbe>) -> Self {
        let settings = AdaptiveSettings::from_probe(probe.as_ref());
        let last_pressure = probe.pressure();
        Self {
            probe,
            settings,
            last_refresh: Instant::now(),
            last_pressure,
        }
    }

    /// The current settings snapshot.
    pub fn settings(&self) -> AdaptiveSettings {
        self.settings
    }

    /// Current memory pressure, read fresh from the probe.
    pub fn pressure(&self) -> f64 {
        self.probe.pressure()
    }

    /// Re-evaluate settings. No-op within 30 s of the last evaluation;
    /// a recomputation is applied only when pressure moved more than
    /// 10 percentage points. Returns whether new settings were applied.
    pub fn refresh(&mut self) -> bool {
        if self.last_refresh.elapsed() < REFRESH_INTERVAL {
            return false;
        }
        self.refresh_unconditionally()
    }

    /// Same as `refresh()` but ignoring the 30 s interval. Exposed so the
    /// owner (and tests) can poll explicitly.
    pub fn refresh_unconditionally(&mut self) -> bool {
        self.last_refresh = Instant::now();
        let pressure = self.probe.pressure();
        if (pressure - self.last_pressure).abs() <= PRESSURE_DELTA {
            return false;
        }
        self.last_pressure = pressure;
        let next = AdaptiveSettings::from_probe(self.probe.as_ref());
        if next != self.settings {
            debug!(
                max_file_size = next.max_file_size,
                capacity = next.cache_capacity,
                "Adaptive settings recomputed"
            );
            self.settings = next;
        }
        true
    }
}
