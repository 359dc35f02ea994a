//! # Propagation Scope
//!
//! How far an authorized inclusion may propagate. `DirectOnly` is the
//! peer-lock signal: routes for the member should only be accepted from
//! direct BGP sessions, never via transit.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ObjectError;

/// Propagation scope attached to each `authorizedIn` entry.
///
/// # Example
///
/// ```
/// use rasa_objects::PropagationScope;
///
/// assert_eq!(PropagationScope::default(), PropagationScope::Unrestricted);
/// assert_eq!(PropagationScope::from_code(1), Some(PropagationScope::DirectOnly));
/// assert_eq!(PropagationScope::parse("directOnly"), Some(PropagationScope::DirectOnly));
/// ```
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PropagationScope {
    /// No special semantics.
    #[default]
    Unrestricted,

    /// Accept only via direct peering sessions.
    DirectOnly,
}

impl PropagationScope {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropagationScope::Unrestricted => "unrestricted",
            PropagationScope::DirectOnly => "direct_only",
        }
    }

    /// Wire code used by the ASN.1 encoding and rpki-client output.
    pub fn code(&self) -> u8 {
        match self {
            PropagationScope::Unrestricted => 0,
            PropagationScope::DirectOnly => 1,
        }
    }

    /// Map a wire code back to a scope.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PropagationScope::Unrestricted),
            1 => Some(PropagationScope::DirectOnly),
            _ => None,
        }
    }

    /// Parse from string (case-insensitive, accepts the camelCase ASN.1 names).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unrestricted" => Some(PropagationScope::Unrestricted),
            "direct_only" | "directonly" | "direct-only" => Some(PropagationScope::DirectOnly),
            _ => None,
        }
    }

    /// Whether this scope carries the peer-lock signal.
    pub fn is_peer_lock(&self) -> bool {
        matches!(self, PropagationScope::DirectOnly)
    }
}

impl fmt::Display for PropagationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PropagationScope {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ObjectError::UnknownPropagation(s.to_string()))
    }
}
