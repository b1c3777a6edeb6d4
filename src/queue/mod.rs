/*!
 * Queue Module
 * Insertion-ordered set underlying the admission queue
 */

pub mod ordered_set;

pub use ordered_set::OrderedSet;
