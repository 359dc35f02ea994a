//! Error types for RASA validation
//!
//! This module defines the validation fault taxonomy. Most of these are
//! not failures of the validator: missing objects, cycles and depth
//! overruns are ordinary outcomes that end one decision or one branch and
//! are recorded in the decision log. Only `InvalidObject` indicates that
//! the upstream feed handed over something malformed.

use chrono::{DateTime, Utc};
use rasa_objects::{Asn, SetName};
use thiserror::Error;

/// Validation fault types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RasaError {
    /// Entity absent from the store
    #[error("{0} not found")]
    NotFound(String),

    /// An authorization object has the wrong shape for where it was found
    #[error("invalid object at {key}: {reason}")]
    InvalidObject {
        /// Store key or object description.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Delegation token used outside its validity window
    #[error("delegation from {issuer} to {delegate} expired (valid {not_before} to {not_after})")]
    ExpiredDelegation {
        /// Issuing (owning) AS.
        issuer: Asn,
        /// Delegate the token was issued to.
        delegate: String,
        /// Start of the window.
        not_before: DateTime<Utc>,
        /// End of the window.
        not_after: DateTime<Utc>,
    },

    /// Delegation token does not cover the published set
    #[error("delegation from {issuer} to {delegate} does not cover {set}")]
    DelegationOutOfScope {
        /// Issuing (owning) AS.
        issuer: Asn,
        /// Delegate the token was issued to.
        delegate: String,
        /// First set outside the token's scope.
        set: SetName,
    },

    /// A set was reached again from one of its own descendants
    #[error("circular reference: {path}")]
    CycleDetected {
        /// The repeated set.
        set: SetName,
        /// Ancestor chain ending in the repeat, e.g. `A -> B -> A`.
        path: String,
    },

    /// Expansion ran out of depth budget
    #[error("maximum depth reached expanding {set}")]
    DepthExceeded {
        /// The set that was not expanded.
        set: SetName,
    },
}

/// Result type for validation operations.
pub type RasaResult<T> = Result<T, RasaError>;

impl RasaError {
    /// Whether this fault is a normal control-flow outcome that only ends
    /// one decision or branch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RasaError::NotFound(_) | RasaError::CycleDetected { .. } | RasaError::DepthExceeded { .. }
        )
    }

    /// Whether the fault points at bad data in the upstream feed.
    pub fn is_data_fault(&self) -> bool {
        matches!(self, RasaError::InvalidObject { .. })
    }

    /// Get error code for audit records.
    pub fn error_code(&self) -> &'static str {
        match self {
            RasaError::NotFound(_) => "NOT_FOUND",
            RasaError::InvalidObject { .. } => "INVALID_OBJECT",
            RasaError::ExpiredDelegation { .. } => "EXPIRED_DELEGATION",
            RasaError::DelegationOutOfScope { .. } => "DELEGATION_OUT_OF_SCOPE",
            RasaError::CycleDetected { .. } => "CYCLE_DETECTED",
            RasaError::DepthExceeded { .. } => "DEPTH_EXCEEDED",
        }
    }

    pub(crate) fn invalid_object(key: impl ToString, reason: impl Into<String>) -> Self {
        RasaError::InvalidObject {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let set = SetName::new("AS-A").unwrap();

        assert!(RasaError::NotFound("x".into()).is_recoverable());
        assert!(RasaError::DepthExceeded { set: set.clone() }.is_recoverable());
        assert!(RasaError::CycleDetected {
            set,
            path: "AS-A -> AS-A".into()
        }
        .is_recoverable());

        let invalid = RasaError::invalid_object("AS1", "wrong variant");
        assert!(!invalid.is_recoverable());
        assert!(invalid.is_data_fault());
        assert_eq!(invalid.error_code(), "INVALID_OBJECT");
    }

    #[test]
    fn test_messages() {
        let err = RasaError::CycleDetected {
            set: SetName::new("AS-A").unwrap(),
            path: "AS-A -> AS-B -> AS-A".into(),
        };
        assert_eq!(err.to_string(), "circular reference: AS-A -> AS-B -> AS-A");

        let err = RasaError::DepthExceeded {
            set: SetName::new("AS-DEEP").unwrap(),
        };
        assert_eq!(err.to_string(), "maximum depth reached expanding AS-DEEP");
    }
}
