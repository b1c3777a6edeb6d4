/*!
 * Admission Guard
 * RAII handle scoping a granted turn to a value's lifetime
 */

use super::AdmissionQueue;
use log::debug;
use std::hash::Hash;

/// A granted turn on an [`AdmissionQueue`]
///
/// Returned by [`AdmissionQueue::admit`]. The holder keeps exclusive
/// occupancy of the queue until the guard is dropped or
/// [`release`](Self::release) is called, at which point the queue advances
/// and the next waiter's settle delay begins.
///
/// Dropping the guard must happen within a Tokio runtime, since advancing
/// the queue starts the next grant timer.
#[must_use = "dropping the guard immediately releases the turn"]
pub struct AdmissionGuard<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    queue: AdmissionQueue<T>,
    item: T,
    released: bool,
}

impl<T> AdmissionGuard<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    pub(super) fn new(queue: AdmissionQueue<T>, item: T) -> Self {
        Self {
            queue,
            item,
            released: false,
        }
    }

    /// The admitted item
    pub fn item(&self) -> &T {
        &self.item
    }

    /// Release the turn explicitly
    pub fn release(mut self) {
        self.released = true;
        self.queue.advance();
        debug!("admission guard released");
    }
}

impl<T> Drop for AdmissionGuard<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if !self.released {
            self.queue.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{AdmissionConfig, AdmissionQueue};

    #[tokio::test]
    async fn test_guard_drop_advances_queue() {
        let q: AdmissionQueue<u32> = AdmissionQueue::new(AdmissionConfig::immediate());
        let guard = q.admit(1).await.unwrap();
        assert_eq!(*guard.item(), 1);
        assert!(q.is_occupied());

        drop(guard);
        assert!(!q.is_occupied());
    }
}
