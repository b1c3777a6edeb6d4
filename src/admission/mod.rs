/*!
 * Admission Queue
 *
 * Fairness-preserving coordination primitive: concurrent callers are granted
 * access to a shared resource strictly in arrival order. A caller enrolls an
 * opaque token, suspends until a release event reaches that token, and
 * releases the turn when its work is done.
 *
 * Release is caller-driven: the coordinator never advances past a grant on
 * its own. After a waiter is resolved the queue is *occupied* until the
 * holder calls [`AdmissionQueue::advance`] (or drops its
 * [`AdmissionGuard`]), which wakes the next waiter after the configured
 * settle delay. The settle delay spaces successive grants; occupancy
 * guarantees single ownership no matter how long the protected section runs.
 */

use crate::queue::OrderedSet;
use ahash::RandomState;
use dashmap::DashMap;
use log::info;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

mod config;
mod guard;
mod operations;
mod stats;
mod wait;

pub use config::{AdmissionConfig, DEFAULT_SETTLE_DELAY};
pub use guard::AdmissionGuard;
pub use stats::{AdmissionStats, AtomicAdmissionStats};

use wait::GrantSignal;

/// Queue state guarded by a single mutex; every mutation is atomic with
/// respect to the others and never observed half-applied by a waiter.
struct State<T>
where
    T: Clone + Eq + Hash,
{
    /// Canonical arrival order
    order: OrderedSet<T>,
    /// The item whose release is in flight, if any. At most one release
    /// runs at a time; the slot being an Option makes that structural.
    releasing: Option<T>,
    /// Fencing token for grant timers: a timer only completes the release
    /// it was spawned for
    grant_epoch: u64,
    /// A granted holder has not yet released
    occupied: bool,
    closed: bool,
}

struct Shared<T>
where
    T: Clone + Eq + Hash,
{
    state: Mutex<State<T>>,
    /// One-shot wait registrations keyed by item identity
    waiters: DashMap<T, oneshot::Sender<GrantSignal>, RandomState>,
    stats: AtomicAdmissionStats,
    /// Handle of the most recently spawned grant timer, retained so
    /// shutdown can cancel it
    grant_task: Mutex<Option<JoinHandle<()>>>,
}

/// Ordered admission queue over caller-supplied tokens
///
/// Cheaply cloneable: clones share the same queue state.
///
/// # Examples
///
/// ```no_run
/// use turnstile::{AdmissionConfig, AdmissionQueue};
///
/// # async fn example() -> turnstile::AdmissionResult<()> {
/// let queue = AdmissionQueue::new(AdmissionConfig::immediate());
///
/// let guard = queue.admit("conversation-42").await?;
/// // ... exclusive access to the protected resource ...
/// guard.release();
/// # Ok(())
/// # }
/// ```
pub struct AdmissionQueue<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    shared: Arc<Shared<T>>,
    config: AdmissionConfig,
}

impl<T> AdmissionQueue<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Create a new admission queue with the specified configuration
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    order: OrderedSet::new(),
                    releasing: None,
                    grant_epoch: 0,
                    occupied: false,
                    closed: false,
                }),
                waiters: DashMap::with_hasher(RandomState::new()),
                stats: AtomicAdmissionStats::new(),
                grant_task: Mutex::new(None),
            }),
            config,
        }
    }

    /// Create with the default configuration (5s settle delay)
    pub fn with_defaults() -> Self {
        Self::new(AdmissionConfig::default())
    }

    /// The configured settle delay
    #[inline]
    pub fn settle_delay(&self) -> std::time::Duration {
        self.config.settle_delay
    }

    /// Shut the queue down: clear the order, cancel any pending grant
    /// timer, and fail all pending waits with
    /// [`AdmissionError::Closed`](crate::AdmissionError::Closed).
    ///
    /// Idempotent. Subsequent waits fail immediately; enroll and release
    /// become no-ops.
    pub fn close(&self) {
        {
            let mut st = self.shared.state.lock();
            if st.closed {
                return;
            }
            st.closed = true;
            st.releasing = None;
            st.occupied = false;
            st.order.clear();
        }

        if let Some(task) = self.shared.grant_task.lock().take() {
            task.abort();
        }

        // Dropping the senders resolves every pending wait with Closed
        self.shared.waiters.clear();
        info!("admission queue closed");
    }

    /// Whether the queue has been shut down
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }
}

impl<T> Clone for AdmissionQueue<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
        }
    }
}

impl<T> Default for AdmissionQueue<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::AdmissionError;

    #[tokio::test]
    async fn test_close_fails_pending_waiters() {
        let queue = AdmissionQueue::with_defaults();
        queue.enroll("a");

        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.await_turn("a").await })
        };

        // Let the waiter register before closing
        while queue.waiter_count() == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        queue.close();
        assert_eq!(waiter.await.unwrap(), Err(AdmissionError::Closed));
        assert!(queue.is_closed());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let queue: AdmissionQueue<u32> = AdmissionQueue::with_defaults();
        queue.close();
        queue.close();
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_operations_after_close_are_inert() {
        let queue = AdmissionQueue::new(AdmissionConfig::immediate());
        queue.close();

        assert!(!queue.enroll("x"));
        assert!(queue.is_empty());
        assert_eq!(queue.await_turn("x").await, Err(AdmissionError::Closed));
        assert_eq!(queue.release(&"x"), Ok(()));
        queue.advance();
    }

    #[test]
    fn test_clones_share_state() {
        let queue = AdmissionQueue::with_defaults();
        let other = queue.clone();
        queue.enroll(7u32);
        assert!(other.contains(&7));
    }
}
