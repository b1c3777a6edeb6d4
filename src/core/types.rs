/*!
 * Core Types
 * Common types used across the crate
 */

use serde::{Deserialize, Serialize};

/// Arrival sequence number assigned at enrollment
pub type SeqNo = u64;

/// Lifecycle state of an item with respect to an admission queue
///
/// `Unqueued -> Queued -> Front -> Releasing -> Unqueued`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Not present in the queue
    Unqueued,
    /// Present, but not first in line
    Queued,
    /// Present and first in line
    Front,
    /// A release is in flight: the settle delay is running and the item
    /// will be removed when it elapses
    Releasing,
}

impl ItemState {
    /// Whether the item is present in the queue in this state
    #[inline]
    pub const fn is_present(self) -> bool {
        !matches!(self, ItemState::Unqueued)
    }
}
