/*!
 * Wait Coordination
 *
 * Converts "my item is not yet first" into an asynchronous suspension and
 * pumps the queue forward on release events.
 *
 * Every release follows the same sequence: the front item is marked
 * releasing, a grant timer sleeps for the settle delay, then the item is
 * removed, its one-shot registration (if any) is resolved, and the queue
 * becomes occupied until the holder releases. Firing a release for item X
 * resolves exactly the one pending wait registered for X; it is never
 * delivered to a different item.
 */

use super::{AdmissionGuard, AdmissionQueue};
use crate::core::errors::{AdmissionError, AdmissionResult};
use log::{debug, error};
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Payload delivered through a wait registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum GrantSignal {
    /// The item reached the front and its release completed
    Granted,
    /// The item was removed while the wait was pending
    Cancelled,
}

impl<T> AdmissionQueue<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Wait until a release event reaches `item`
    ///
    /// Fails immediately with [`AdmissionError::NotEnrolled`] if the item is
    /// not currently enrolled; enroll first. Otherwise suspends until an
    /// explicit release (`advance`, `release`, or a guard drop) works its
    /// way to this item, then resolves `Ok(())` once the settle delay has
    /// elapsed and the item has been removed from the queue.
    ///
    /// At most one wait per item: a newer call supersedes an older one,
    /// which then fails with [`AdmissionError::Closed`].
    pub async fn await_turn(&self, item: T) -> AdmissionResult<()> {
        let rx = self.register(item, false, false)?;
        Self::settle(rx).await
    }

    /// Enroll, wait for the turn, and wrap it in an RAII guard
    ///
    /// Unlike [`await_turn`](Self::await_turn), this self-starts the grant
    /// when the item lands at the front of an unoccupied queue with no
    /// release in flight, so the first caller on an empty queue needs no
    /// external kick. Dropping the returned guard releases the turn.
    pub async fn admit(&self, item: T) -> AdmissionResult<AdmissionGuard<T>> {
        let rx = self.register(item.clone(), true, true)?;
        Self::settle(rx).await?;
        Ok(AdmissionGuard::new(self.clone(), item))
    }

    /// Release the current front item, if any
    ///
    /// Marks the previous holder's turn as over and fires the release
    /// sequence for the front item. Total: no-op on an empty or closed
    /// queue, or while a release is already in flight.
    pub fn advance(&self) {
        let fire = {
            let mut st = self.shared.state.lock();
            if st.closed {
                return;
            }
            st.occupied = false;
            if st.releasing.is_some() {
                return;
            }
            match st.order.first().cloned() {
                Some(front) => {
                    st.releasing = Some(front.clone());
                    st.grant_epoch += 1;
                    Some((front, st.grant_epoch))
                }
                None => None,
            }
        };

        if let Some((item, epoch)) = fire {
            self.spawn_grant(item, epoch);
        }
    }

    /// Release a specific item, which must be first in line
    ///
    /// - Absent item: silent no-op — the race between "already removed" and
    ///   "asked to remove" is expected and benign.
    /// - Present but not first: [`AdmissionError::OrderViolation`], queue
    ///   unchanged. The caller tried to skip the line; this is a broken
    ///   invariant in the calling code and is surfaced loudly.
    /// - Already releasing: no-op, so a duplicate release cannot double-fire.
    pub fn release(&self, item: &T) -> AdmissionResult<()> {
        let epoch = {
            let mut st = self.shared.state.lock();
            if st.closed || !st.order.contains(item) {
                return Ok(());
            }
            if st.releasing.as_ref() == Some(item) {
                return Ok(());
            }
            if st.order.first() != Some(item) {
                self.shared.stats.inc_order_violations();
                error!("release for an item that is not first in line");
                return Err(AdmissionError::OrderViolation);
            }
            st.occupied = false;
            st.releasing = Some(item.clone());
            st.grant_epoch += 1;
            st.grant_epoch
        };

        self.spawn_grant(item.clone(), epoch);
        Ok(())
    }

    /// Register a one-shot wait keyed by the item's identity
    ///
    /// Runs under the state lock so a registration can never miss a grant
    /// that removes the item concurrently: either the item is still present
    /// here, in which case the grant timer will find the registration, or
    /// it is already gone and the caller gets `NotEnrolled`.
    fn register(
        &self,
        item: T,
        enroll: bool,
        self_start: bool,
    ) -> AdmissionResult<oneshot::Receiver<GrantSignal>> {
        let (rx, fire) = {
            let mut st = self.shared.state.lock();
            if st.closed {
                return Err(AdmissionError::Closed);
            }
            if enroll {
                if st.order.insert(item.clone()) {
                    self.shared.stats.inc_enrolled();
                }
            } else if !st.order.contains(&item) {
                return Err(AdmissionError::NotEnrolled);
            }

            let (tx, rx) = oneshot::channel();
            self.shared.waiters.insert(item.clone(), tx);

            let fire = self_start
                && !st.occupied
                && st.releasing.is_none()
                && st.order.first() == Some(&item);
            if fire {
                st.releasing = Some(item.clone());
                st.grant_epoch += 1;
                (rx, Some(st.grant_epoch))
            } else {
                (rx, None)
            }
        };

        if let Some(epoch) = fire {
            self.spawn_grant(item, epoch);
        }
        Ok(rx)
    }

    /// Spawn the grant timer for one release
    ///
    /// Sleeps for the settle delay, then removes the item and resolves its
    /// registration. The epoch fences stale timers: a release cancelled by
    /// `remove` (or restarted after re-enrollment) leaves its old timer
    /// waking to a mismatch, where it does nothing.
    ///
    /// Must be called within a Tokio runtime.
    fn spawn_grant(&self, item: T, epoch: u64) {
        let shared = Arc::clone(&self.shared);
        let delay = self.config.settle_delay;

        let task = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let granted = {
                let mut st = shared.state.lock();
                if st.releasing.as_ref() == Some(&item) && st.grant_epoch == epoch {
                    st.releasing = None;
                    st.order.remove(&item);
                    st.occupied = true;
                    true
                } else {
                    false
                }
            };

            if granted {
                if let Some((_, tx)) = shared.waiters.remove(&item) {
                    let _ = tx.send(GrantSignal::Granted);
                }
                shared.stats.inc_granted();
                debug!("admission granted after settle delay");
            }
        });

        *self.shared.grant_task.lock() = Some(task);
    }

    /// Resolve a wait registration into the caller-facing result
    async fn settle(rx: oneshot::Receiver<GrantSignal>) -> AdmissionResult<()> {
        match rx.await {
            Ok(GrantSignal::Granted) => Ok(()),
            Ok(GrantSignal::Cancelled) => Err(AdmissionError::Cancelled),
            // Sender dropped: the queue was closed or the wait superseded
            Err(_) => Err(AdmissionError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{AdmissionConfig, AdmissionQueue};
    use crate::core::errors::AdmissionError;
    use std::time::Duration;

    fn fast() -> AdmissionQueue<&'static str> {
        AdmissionQueue::new(AdmissionConfig::immediate())
    }

    #[tokio::test]
    async fn test_await_turn_requires_enrollment() {
        let q = fast();
        assert_eq!(q.await_turn("nope").await, Err(AdmissionError::NotEnrolled));
    }

    #[tokio::test]
    async fn test_advance_resolves_front_waiter() {
        let q = fast();
        q.enroll("a");

        let waiter = {
            let q = q.clone();
            tokio::spawn(async move { q.await_turn("a").await })
        };
        while q.waiter_count() == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        q.advance();
        assert_eq!(waiter.await.unwrap(), Ok(()));
        assert!(!q.contains(&"a"));
        assert!(q.is_occupied());
    }

    #[tokio::test]
    async fn test_release_not_first_is_order_violation() {
        let q = fast();
        q.enroll("a");
        q.enroll("b");

        assert_eq!(q.release(&"b"), Err(AdmissionError::OrderViolation));
        // Queue state unchanged
        assert!(q.contains(&"b"));
        assert_eq!(q.len(), 2);
        assert_eq!(q.first(), Some("a"));
        assert_eq!(q.stats().order_violations, 1);
    }

    #[tokio::test]
    async fn test_release_absent_is_noop() {
        let q = fast();
        assert_eq!(q.release(&"ghost"), Ok(()));
        q.enroll("a");
        assert_eq!(q.release(&"ghost"), Ok(()));
        assert_eq!(q.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_cancels_pending_wait() {
        let q = fast();
        q.enroll("a");
        q.enroll("b");

        let waiter = {
            let q = q.clone();
            tokio::spawn(async move { q.await_turn("b").await })
        };
        while q.waiter_count() == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        assert!(q.remove(&"b"));
        assert_eq!(waiter.await.unwrap(), Err(AdmissionError::Cancelled));
        assert_eq!(q.stats().cancelled_total, 1);
    }

    #[tokio::test]
    async fn test_admit_self_starts_on_empty_queue() {
        let q = fast();
        let guard = q.admit("solo").await.unwrap();
        assert!(!q.contains(&"solo"));
        assert!(q.is_occupied());
        guard.release();
        assert!(!q.is_occupied());
    }

    #[tokio::test]
    async fn test_admit_queues_behind_holder() {
        let q = fast();
        let first = q.admit("one").await.unwrap();

        let second = {
            let q = q.clone();
            tokio::spawn(async move { q.admit("two").await })
        };
        while q.waiter_count() == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        // Occupied: the second admission must not start on its own
        assert!(!second.is_finished());

        first.release();
        let second = second.await.unwrap().unwrap();
        assert!(q.is_occupied());
        second.release();
    }

    #[tokio::test]
    async fn test_release_never_wakes_a_different_item() {
        let q = fast();
        q.enroll("a");
        q.enroll("b");

        let mut wait_b = tokio_test::task::spawn({
            let q = q.clone();
            async move { q.await_turn("b").await }
        });
        tokio_test::assert_pending!(wait_b.poll());

        // Releasing the front must not touch the second in line
        q.advance();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!q.contains(&"a"));
        tokio_test::assert_pending!(wait_b.poll());
        drop(wait_b);
        q.remove(&"b");
    }

    #[tokio::test]
    async fn test_duplicate_release_fires_once() {
        let q = AdmissionQueue::new(AdmissionConfig::with_settle_delay(
            Duration::from_millis(30),
        ));
        q.enroll("a");

        let waiter = {
            let q = q.clone();
            tokio::spawn(async move { q.await_turn("a").await })
        };
        while q.waiter_count() == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        assert_eq!(q.release(&"a"), Ok(()));
        // Second release while the settle delay runs: no-op
        assert_eq!(q.release(&"a"), Ok(()));
        q.advance();

        assert_eq!(waiter.await.unwrap(), Ok(()));
        assert_eq!(q.stats().granted_total, 1);
    }
}
