//! Decision values returned by the validator primitives.

use rasa_objects::PropagationScope;
use serde::Serialize;

use crate::error::RasaError;
use crate::log::Severity;

/// Outcome of one authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the inclusion is authorized
    pub authorized: bool,

    /// Human-readable reason, identical to the logged one
    pub reason: String,

    /// Severity
    pub severity: Severity,

    /// Propagation scope of the matching `authorizedIn` entry, if one matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation: Option<PropagationScope>,

    /// Fault code when the outcome came from a validation fault
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<&'static str>,
}

impl Decision {
    /// Positive, informational decision.
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            authorized: true,
            reason: reason.into(),
            severity: Severity::Info,
            propagation: None,
            fault: None,
        }
    }

    /// Negative decision at the given severity.
    pub fn deny(reason: impl Into<String>, severity: Severity) -> Self {
        Self {
            authorized: false,
            reason: reason.into(),
            severity,
            propagation: None,
            fault: None,
        }
    }

    /// Negative decision derived from a validation fault.
    pub fn from_fault(fault: &RasaError, prefix: &str, severity: Severity) -> Self {
        Self {
            authorized: false,
            reason: format!("{prefix}: {fault}"),
            severity,
            propagation: None,
            fault: Some(fault.error_code()),
        }
    }

    /// Attach the matched propagation scope.
    pub fn with_propagation(mut self, scope: PropagationScope) -> Self {
        self.propagation = Some(scope);
        self
    }

    /// Whether this decision is a security event.
    pub fn is_security_event(&self) -> bool {
        self.severity == Severity::SecurityEvent
    }
}

/// Why a signer was or was not accepted as publisher of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationBasis {
    /// Signer is the owning authority itself.
    Direct,
    /// Signer holds a current delegation token.
    Delegated,
    /// No token from the owner to the signer.
    NoDelegation,
    /// Token exists but is outside its validity window.
    Expired,
    /// Token does not cover the object.
    OutOfScope,
}

/// Outcome of a delegation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegationDecision {
    /// Whether the signer may publish the object
    pub valid: bool,
    /// Basis of the outcome
    pub basis: DelegationBasis,
    /// Human-readable reason
    pub reason: String,
}

/// Result of checking both directions of a membership claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BidirectionalCheck {
    /// Whether the set's RASA-SET lists the ASN. `None` when the set has
    /// no RASA-SET.
    pub declared: Option<bool>,
    /// The member's own consent decision.
    pub consent: Decision,
}

impl BidirectionalCheck {
    /// Consent is given and the owner does not contradict the claim.
    pub fn passes(&self) -> bool {
        self.consent.authorized && self.declared != Some(false)
    }
}
