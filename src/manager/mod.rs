/*!
 * Admission Manager
 * Central registry of admission queues keyed by resource
 */

use crate::admission::{AdmissionConfig, AdmissionQueue, AdmissionStats};
use ahash::RandomState;
use dashmap::DashMap;
use log::info;
use std::hash::Hash;
use std::sync::Arc;

/// Registry of admission queues, one per protected resource
///
/// Applications that serialize work per conversation, per tenant, or per
/// task keep one queue for each such resource. Queues are created on first
/// use with the manager's configuration and handed out as cheap clones.
pub struct AdmissionManager<R, T>
where
    R: Clone + Eq + Hash,
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    queues: Arc<DashMap<R, AdmissionQueue<T>, RandomState>>,
    config: AdmissionConfig,
}

impl<R, T> AdmissionManager<R, T>
where
    R: Clone + Eq + Hash,
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            queues: Arc::new(DashMap::with_hasher(RandomState::new())),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(AdmissionConfig::default())
    }

    /// Get the queue for a resource, creating it on first use
    pub fn queue(&self, resource: R) -> AdmissionQueue<T> {
        self.queues
            .entry(resource)
            .or_insert_with(|| AdmissionQueue::new(self.config.clone()))
            .value()
            .clone()
    }

    /// Look up an existing queue without creating one
    pub fn get(&self, resource: &R) -> Option<AdmissionQueue<T>> {
        self.queues.get(resource).map(|q| q.value().clone())
    }

    /// Close a resource's queue and drop it from the registry
    pub fn destroy(&self, resource: &R) -> bool {
        match self.queues.remove(resource) {
            Some((_, queue)) => {
                queue.close();
                true
            }
            None => false,
        }
    }

    /// Drop queues that are empty, unoccupied, and waiter-free
    ///
    /// Returns how many were removed. Outstanding clones of a dropped queue
    /// keep working; the registry just stops handing it out.
    pub fn cleanup_idle(&self) -> usize {
        let before = self.queues.len();
        self.queues.retain(|_, queue| !queue.is_idle());
        let removed = before - self.queues.len();
        if removed > 0 {
            info!("cleaned up {} idle admission queues", removed);
        }
        removed
    }

    /// Number of registered queues
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Per-resource statistics snapshot
    pub fn stats(&self) -> Vec<(R, AdmissionStats)> {
        self.queues
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stats()))
            .collect()
    }

    /// Close every registered queue and clear the registry
    pub fn close_all(&self) {
        for entry in self.queues.iter() {
            entry.value().close();
        }
        self.queues.clear();
        info!("admission manager shut down");
    }
}

impl<R, T> Clone for AdmissionManager<R, T>
where
    R: Clone + Eq + Hash,
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            queues: Arc::clone(&self.queues),
            config: self.config.clone(),
        }
    }
}

impl<R, T> Default for AdmissionManager<R, T>
where
    R: Clone + Eq + Hash,
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::with_defaults()
    }
}
