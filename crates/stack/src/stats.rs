//! Allocation counters for [`StackArena`](crate::StackArena)

use core::fmt;

/// Snapshot of arena activity
///
/// `used`, `capacity` and `peak_used` are always reported. The event counters
/// stay at zero unless [`StackConfig::track_stats`](crate::StackConfig::track_stats)
/// is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackStats {
    /// Successful allocations
    pub allocations: u64,
    /// Allocations rejected for any reason
    pub failed_allocations: u64,
    /// Successful rewinds to a marker (guards included)
    pub rewinds: u64,
    /// Calls to `clear`
    pub clears: u64,
    /// Highest top observed since creation or the last stats reset
    pub peak_used: usize,
    /// Bytes below the top, padding included
    pub used: usize,
    /// Total buffer size
    pub capacity: usize,
}

impl StackStats {
    /// Fraction of the buffer currently in use, `0.0..=1.0`
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.used as f64 / self.capacity as f64
        }
    }
}

impl fmt::Display for StackStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StackStats {{ used: {}/{} bytes, peak: {} bytes, allocs: {}, failed: {}, rewinds: {}, clears: {} }}",
            self.used,
            self.capacity,
            self.peak_used,
            self.allocations,
            self.failed_allocations,
            self.rewinds,
            self.clears
        )
    }
}

/// Mutable counters owned by the arena
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub(crate) allocations: u64,
    pub(crate) failed_allocations: u64,
    pub(crate) rewinds: u64,
    pub(crate) clears: u64,
    pub(crate) peak_used: usize,
}

impl Counters {
    pub(crate) fn snapshot(&self, used: usize, capacity: usize) -> StackStats {
        StackStats {
            allocations: self.allocations,
            failed_allocations: self.failed_allocations,
            rewinds: self.rewinds,
            clears: self.clears,
            peak_used: self.peak_used.max(used),
            used,
            capacity,
        }
    }
}
