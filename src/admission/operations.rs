/*!
 * Admission Queue Operations
 * Enrollment, removal, and positional queries
 */

use super::wait::GrantSignal;
use super::AdmissionQueue;
use crate::core::types::ItemState;
use log::{debug, warn};
use std::hash::Hash;

impl<T> AdmissionQueue<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Enroll an item as a pending candidate for admission
    ///
    /// Idempotent: re-enrolling a present item changes nothing and keeps
    /// its original position. Returns true if the item was newly added.
    pub fn enroll(&self, item: T) -> bool {
        let mut st = self.shared.state.lock();
        if st.closed {
            warn!("enroll on a closed admission queue ignored");
            return false;
        }
        let added = st.order.insert(item);
        if added {
            self.shared.stats.inc_enrolled();
            debug!("item enrolled at position {}", st.order.len() - 1);
        }
        added
    }

    /// Remove an item from the queue
    ///
    /// The cancellation hook: removing an item drops any in-flight release
    /// for it and fails its pending wait (if any) with
    /// [`AdmissionError::Cancelled`](crate::AdmissionError::Cancelled).
    /// Removing an absent item is a silent no-op. The next waiter is NOT
    /// woken; releases stay caller-driven.
    pub fn remove(&self, item: &T) -> bool {
        let removed = {
            let mut st = self.shared.state.lock();
            let removed = st.order.remove(item);
            if st.releasing.as_ref() == Some(item) {
                st.releasing = None;
            }
            removed
        };

        if removed {
            if let Some((_, tx)) = self.shared.waiters.remove(item) {
                let _ = tx.send(GrantSignal::Cancelled);
                self.shared.stats.inc_cancelled();
            }
            debug!("item removed from admission queue");
        }
        removed
    }

    /// Membership test
    pub fn contains(&self, item: &T) -> bool {
        self.shared.state.lock().order.contains(item)
    }

    /// Earliest still-present item
    pub fn first(&self) -> Option<T> {
        self.shared.state.lock().order.first().cloned()
    }

    /// Most recently arrived still-present item
    pub fn last(&self) -> Option<T> {
        self.shared.state.lock().order.last().cloned()
    }

    /// Whether the item is first in line
    pub fn is_first(&self, item: &T) -> bool {
        self.shared.state.lock().order.first() == Some(item)
    }

    /// Whether the item is last in line
    pub fn is_last(&self, item: &T) -> bool {
        self.shared.state.lock().order.last() == Some(item)
    }

    /// Zero-based arrival-order position, or None if absent
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.shared.state.lock().order.index_of(item)
    }

    /// Number of enrolled items
    pub fn len(&self) -> usize {
        self.shared.state.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().order.is_empty()
    }

    /// Lifecycle state of an item
    pub fn state(&self, item: &T) -> ItemState {
        let st = self.shared.state.lock();
        if st.releasing.as_ref() == Some(item) {
            ItemState::Releasing
        } else if !st.order.contains(item) {
            ItemState::Unqueued
        } else if st.order.first() == Some(item) {
            ItemState::Front
        } else {
            ItemState::Queued
        }
    }

    /// Whether a granted holder has not yet released its turn
    pub fn is_occupied(&self) -> bool {
        self.shared.state.lock().occupied
    }

    /// Approximate count of pending wait registrations (for diagnostics)
    pub fn waiter_count(&self) -> usize {
        self.shared.waiters.len()
    }

    /// Nothing enrolled, nothing granted, nobody waiting
    pub fn is_idle(&self) -> bool {
        let st = self.shared.state.lock();
        st.order.is_empty()
            && st.releasing.is_none()
            && !st.occupied
            && self.shared.waiters.is_empty()
    }

    /// Get snapshot of current stats
    pub fn stats(&self) -> super::AdmissionStats {
        let st = self.shared.state.lock();
        self.shared
            .stats
            .snapshot(st.order.len(), st.occupied, self.shared.waiters.len())
    }
}
