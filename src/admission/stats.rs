/*!
 * Lock-Free Admission Statistics
 * Uses atomic counters for zero-contention stats tracking in hot admission paths
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic admission statistics for lock-free updates
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - All operations use relaxed ordering
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct AtomicAdmissionStats {
    enrolled_total: AtomicU64,
    granted_total: AtomicU64,
    cancelled_total: AtomicU64,
    order_violations: AtomicU64,
}

impl AtomicAdmissionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment enrollments (lock-free)
    #[inline(always)]
    pub fn inc_enrolled(&self) {
        self.enrolled_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment completed grants (lock-free)
    #[inline(always)]
    pub fn inc_granted(&self) {
        self.granted_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment cancelled waits (lock-free)
    #[inline(always)]
    pub fn inc_cancelled(&self) {
        self.cancelled_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment rejected out-of-order releases (lock-free)
    #[inline(always)]
    pub fn inc_order_violations(&self) {
        self.order_violations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats
    ///
    /// Counter values may not be perfectly consistent with each other due to
    /// concurrent updates, but each individual value is accurate.
    pub fn snapshot(&self, len: usize, occupied: bool, waiters: usize) -> AdmissionStats {
        AdmissionStats {
            enrolled_total: self.enrolled_total.load(Ordering::Relaxed),
            granted_total: self.granted_total.load(Ordering::Relaxed),
            cancelled_total: self.cancelled_total.load(Ordering::Relaxed),
            order_violations: self.order_violations.load(Ordering::Relaxed),
            len,
            occupied,
            waiters,
        }
    }
}

/// Admission queue statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionStats {
    pub enrolled_total: u64,
    pub granted_total: u64,
    pub cancelled_total: u64,
    pub order_violations: u64,
    /// Items currently enrolled
    pub len: usize,
    /// Whether a granted holder has not yet released
    pub occupied: bool,
    /// Pending wait registrations
    pub waiters: usize,
}
