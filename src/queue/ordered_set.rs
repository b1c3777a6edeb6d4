/*!
 * Ordered Set
 *
 * Insertion-ordered set of admission tokens. Each item gets a monotonically
 * increasing sequence number at insertion; a hash map gives O(1) membership
 * and a BTreeMap over sequence numbers gives O(log n) front/back access.
 */

use crate::core::types::SeqNo;
use ahash::RandomState;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Insertion-ordered set with positional queries
///
/// Invariants:
/// - No duplicates: inserting a present item is a no-op.
/// - Arrival order is preserved; the earliest still-present item is first.
#[derive(Debug, Clone)]
pub struct OrderedSet<T>
where
    T: Clone + Eq + Hash,
{
    next_seq: SeqNo,
    by_item: HashMap<T, SeqNo, RandomState>,
    by_seq: BTreeMap<SeqNo, T>,
}

impl<T> OrderedSet<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            next_seq: 0,
            by_item: HashMap::with_hasher(RandomState::new()),
            by_seq: BTreeMap::new(),
        }
    }

    /// Insert an item at the back; returns false if it was already present
    pub fn insert(&mut self, item: T) -> bool {
        if self.by_item.contains_key(&item) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_item.insert(item.clone(), seq);
        self.by_seq.insert(seq, item);
        true
    }

    /// Remove an item; returns false if it was absent
    pub fn remove(&mut self, item: &T) -> bool {
        match self.by_item.remove(item) {
            Some(seq) => {
                self.by_seq.remove(&seq);
                true
            }
            None => false,
        }
    }

    /// Membership test
    #[inline]
    pub fn contains(&self, item: &T) -> bool {
        self.by_item.contains_key(item)
    }

    /// Earliest still-present item
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.by_seq.first_key_value().map(|(_, item)| item)
    }

    /// Most recently arrived still-present item
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.by_seq.last_key_value().map(|(_, item)| item)
    }

    /// Zero-based arrival-order position, or None if absent
    pub fn index_of(&self, item: &T) -> Option<usize> {
        let seq = *self.by_item.get(item)?;
        Some(self.by_seq.range(..seq).count())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_seq.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_seq.is_empty()
    }

    /// Iterate items in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.by_seq.values()
    }

    /// Drop all items
    pub fn clear(&mut self) {
        self.by_item.clear();
        self.by_seq.clear();
    }
}

impl<T> Default for OrderedSet<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
