/*!
 * Admission Configuration
 *
 * Runtime configuration for the admission queue
 */

use std::time::Duration;

/// Default spacing between a release event and the corresponding grant.
/// The protected resource usually wants breathing room between uses, not
/// just mutual exclusion.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Admission queue configuration
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Settle delay enforced between a release and the next grant
    pub settle_delay: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl AdmissionConfig {
    /// Configuration with a custom settle delay
    pub const fn with_settle_delay(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }

    /// Configuration with no settle delay (grants fire as soon as released)
    pub const fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
        }
    }
}
