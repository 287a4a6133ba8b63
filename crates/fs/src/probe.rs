//! Host resource probing.
//!
//! The cache and the streaming read guards key their behavior off current
//! memory pressure. The probe is injectable so tests can simulate pressure
//! without depending on actual host memory state.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use sysinfo::System;

/// A source of host memory readings.
pub trait ResourceProbe: Send + Sync {
    /// Total host memory in bytes.
    fn total_memory(&self) -> u64;

    /// Memory currently available for allocation, in bytes.
    fn free_memory(&self) -> u64;

    /// Fraction of host memory currently in use, in `[0.0, 1.0]`.
    fn pressure(&self) -> f64 {
        let total = self.total_memory();
        if total == 0 {
            return 0.0;
        }
        1.0 - self.free_memory() as f64 / total as f64
    }
}

/// Production probe backed by `sysinfo`.
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SysinfoProbe {
    fn total_memory(&self) -> u64 {
        match self.system.lock() {
            Ok(sys) => sys.total_memory(),
            Err(_) => 0,
        }
    }

    fn free_memory(&self) -> u64 {
        match self.system.lock() {
            Ok(mut sys) => {
                sys.refresh_memory();
                sys.available_memory()
            }
            Err(_) => 0,
        }
    }
}

/// A probe with fixed total memory and adjustable free memory.
/// Used by tests to drive the pressure-dependent paths deterministically.
pub struct FixedProbe {
    total: u64,
    free: AtomicU64,
}

impl FixedProbe {
    pub fn new(total: u64, free: u64) -> Self {
        Self {
            total,
            free: AtomicU64::new(free),
        }
    }

    /// Simulate a change in available memory.
    pub fn set_free(&self, free: u64) {
        self.free.store(free, Ordering::Relaxed);
    }
}

impl ResourceProbe for FixedProbe {
    fn total_memory(&self) -> u64 {
        self.total
    }

    fn free_memory(&self) -> u64 {
        self.free.load(Ordering::Relaxed)
    }
}
