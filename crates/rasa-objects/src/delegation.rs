//! # Delegation Tokens
//!
//! A delegation token lets a third party (an upstream, a registry, a
//! managed-service provider) publish RASA objects on behalf of an AS-SET
//! owner, within a scope of set names and a validity window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{Asn, SetName};
use crate::objects::Validity;

/// Signed grant from an owning AS to a delegate.
///
/// # Example
///
/// ```
/// use rasa_objects::{Asn, DelegationToken, SetName, Validity};
/// use chrono::{Duration, Utc};
///
/// let token = DelegationToken::new(
///     Asn::new(64496),
///     "AS2914",
///     vec![SetName::new("AS64496:AS-CUSTOMERS").unwrap()],
///     Validity::starting_now(Duration::days(90)),
/// );
///
/// assert!(token.covers(&SetName::new("AS64496:AS-CUSTOMERS").unwrap()));
/// assert!(token.is_current(Utc::now()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelegationToken {
    /// Entity allowed to publish (e.g. "AS2914" or an organisation handle)
    pub delegated_to: String,

    /// Set names nominally covered by the grant
    #[serde(default)]
    pub scope: Vec<SetName>,

    /// Validity window
    pub validity: Validity,

    /// Owning AS that issued the grant
    pub issued_by: Asn,
}

impl DelegationToken {
    /// Create a delegation token.
    pub fn new(
        issued_by: Asn,
        delegated_to: impl Into<String>,
        scope: Vec<SetName>,
        validity: Validity,
    ) -> Self {
        Self {
            delegated_to: delegated_to.into(),
            scope,
            validity,
            issued_by,
        }
    }

    /// Lookup key `(issuer, delegate)`, with the delegate normalized by
    /// [`delegate_key`](Self::delegate_key).
    pub fn key(&self) -> (Asn, String) {
        (self.issued_by, Self::delegate_key(&self.delegated_to))
    }

    /// Canonical form of a delegate id. Anything [`Asn::parse`] accepts
    /// (`as2914`, `2914`) becomes `AS2914`; other handles are trimmed.
    pub fn delegate_key(delegate: &str) -> String {
        let delegate = delegate.trim();
        match Asn::parse(delegate) {
            Some(asn) => asn.to_string(),
            None => delegate.to_string(),
        }
    }

    /// Whether `set` is within the token's declared scope.
    pub fn covers(&self, set: &SetName) -> bool {
        self.scope.iter().any(|covered| covered == set)
    }

    /// Whether the token is inside its validity window at `at`.
    pub fn is_current(&self, at: DateTime<Utc>) -> bool {
        self.validity.contains(at)
    }
}
