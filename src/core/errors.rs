/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for admission operations
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// Admission queue errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", rename_all = "snake_case")]
pub enum AdmissionError {
    #[error("item is not enrolled in the queue")]
    #[diagnostic(
        code(admission::not_enrolled),
        help("Call enroll (or admit) before waiting for a turn.")
    )]
    NotEnrolled,

    #[error("item is enrolled but not first in line")]
    #[diagnostic(
        code(admission::order_violation),
        help("Only the front item may be released. A waiter tried to skip the line.")
    )]
    OrderViolation,

    #[error("wait was cancelled because the item was removed")]
    #[diagnostic(
        code(admission::cancelled),
        help("The item was removed from the queue while a wait was pending.")
    )]
    Cancelled,

    #[error("admission queue is closed")]
    #[diagnostic(
        code(admission::closed),
        help("The queue was shut down. No further admissions are possible.")
    )]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AdmissionError::NotEnrolled.to_string(),
            "item is not enrolled in the queue"
        );
        assert_eq!(
            AdmissionError::OrderViolation.to_string(),
            "item is enrolled but not first in line"
        );
    }

    #[test]
    fn test_error_serde_round_trip() {
        let json = serde_json::to_string(&AdmissionError::OrderViolation).unwrap();
        let back: AdmissionError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AdmissionError::OrderViolation);
    }
}
