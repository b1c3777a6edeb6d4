/*!
 * Turnstile
 * Ordered admission queue: FIFO fairness for async access to shared resources
 */

pub mod admission;
pub mod core;
pub mod manager;
pub mod queue;
pub mod telemetry;

// Re-exports
pub use admission::{
    AdmissionConfig, AdmissionGuard, AdmissionQueue, AdmissionStats, DEFAULT_SETTLE_DELAY,
};
pub use crate::core::errors::{AdmissionError, AdmissionResult};
pub use crate::core::types::ItemState;
pub use manager::AdmissionManager;
pub use queue::OrderedSet;
pub use telemetry::init_tracing;
