//! Buffer pool statistics tracking.
//!
//! The pool records two kinds of events: how lookups resolved (hit or miss)
//! and what that cost in disk traffic (reads, write-backs, evictions). The
//! counters are private; the pool feeds them through the `record_*` methods
//! and observers take a [`StatsSnapshot`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Event counters for one buffer pool.
///
/// All counters are atomic, so the pool can bump them from any thread
/// without holding its latch. `Ordering::Relaxed` everywhere: each counter
/// stands alone, and a snapshot is allowed to be a slightly torn view of a
/// moving system.
///
/// # Example
/// ```
/// use ferritedb::BufferPoolStats;
///
/// let stats = BufferPoolStats::new();
/// let snapshot = stats.snapshot();
/// assert_eq!(snapshot.cache_hits, 0);
/// assert_eq!(snapshot.hit_rate(), 0.0);
/// ```
#[derive(Debug, Default)]
pub struct BufferPoolStats {
    /// Lookups answered from a resident frame.
    hits: AtomicU64,

    /// Lookups that had to go through a frame load.
    misses: AtomicU64,

    /// Victim frames reclaimed by the replacer.
    evictions: AtomicU64,

    /// Page images read from disk.
    disk_reads: AtomicU64,

    /// Page images written to disk (evictions and explicit flushes).
    disk_writes: AtomicU64,
}

impl BufferPoolStats {
    /// Create a stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disk_read(&self) {
        self.disk_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disk_write(&self) {
        self.disk_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.hits.load(Ordering::Relaxed),
            cache_misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            pages_read: self.disk_reads.load(Ordering::Relaxed),
            pages_written: self.disk_writes.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the pool's counters.
///
/// Plain integers: safe to print, compare, or diff against an earlier
/// snapshot to measure one phase of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub pages_read: u64,
    pub pages_written: u64,
}

impl StatsSnapshot {
    /// Fraction of lookups answered without a frame load (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Total page images moved between memory and disk.
    pub fn disk_traffic(&self) -> u64 {
        self.pages_read + self.pages_written
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={} misses={} ({:.1}% hit rate), evictions={}, disk reads={} writes={}",
            self.cache_hits,
            self.cache_misses,
            self.hit_rate() * 100.0,
            self.evictions,
            self.pages_read,
            self.pages_written
        )
    }
}
