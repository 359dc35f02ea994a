//! Errors raised while constructing RASA records.

use thiserror::Error;

/// Record construction errors.
///
/// These are shape errors in the records themselves; they surface when a
/// feed hands over an object that cannot be represented.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ObjectError {
    /// Not a valid AS number
    #[error("Invalid AS number: {0}")]
    InvalidAsn(String),

    /// Not a valid AS-SET name
    #[error("Invalid AS-SET name {name:?}: {reason}")]
    InvalidSetName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A RASA-AUTH names both an ASN and an AS-SET as its subject
    #[error("RASA-AUTH names both an AS and an AS-SET as authorized entity")]
    AmbiguousEntity,

    /// A RASA-AUTH names neither an ASN nor an AS-SET as its subject
    #[error("RASA-AUTH names no authorized entity")]
    MissingEntity,

    /// notBefore is after notAfter
    #[error("Invalid validity window: notBefore is after notAfter")]
    InvalidValidity,

    /// Unknown propagation scope code or name
    #[error("Unknown propagation scope: {0}")]
    UnknownPropagation(String),
}

/// Result type for record construction.
pub type ObjectResult<T> = Result<T, ObjectError>;
