//! # Identifiers
//!
//! Autonomous System Numbers, AS-SET names and the entity identifier that
//! keys the shared RASA object space.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ObjectError;

/// An Autonomous System Number.
///
/// Displayed as `AS<n>`. Parsing accepts `AS<n>`, `as<n>` and bare digits.
///
/// # Example
///
/// ```
/// use rasa_objects::Asn;
///
/// let asn: Asn = "AS15169".parse().unwrap();
/// assert_eq!(asn, Asn::new(15169));
/// assert_eq!(asn.to_string(), "AS15169");
/// assert_eq!("64496".parse::<Asn>().unwrap(), Asn::new(64496));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Asn(u32);

impl Asn {
    /// AS0, reserved by RFC 7607. Never a valid owning authority.
    pub const RESERVED: Asn = Asn(0);

    /// Wrap a raw AS number.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The raw AS number.
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Whether this is the reserved AS0.
    pub const fn is_reserved(&self) -> bool {
        self.0 == 0
    }

    /// Parse from `AS<n>` or bare digits.
    ///
    /// # Returns
    ///
    /// `Some(Asn)` if valid, `None` otherwise
    pub fn parse(s: &str) -> Option<Self> {
        let digits = match s.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("AS") => &s[2..],
            _ => s,
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }
}

impl fmt::Display for Asn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AS{}", self.0)
    }
}

impl FromStr for Asn {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ObjectError::InvalidAsn(s.to_string()))
    }
}

impl From<u32> for Asn {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// The name of an AS-SET, e.g. `AS2914:AS-GLOBAL`.
///
/// Names are compared by exact string equality. Construction rejects empty
/// names, names containing whitespace, and strings that are really an ASN.
///
/// # Example
///
/// ```
/// use rasa_objects::SetName;
///
/// let name = SetName::new("AS2914:AS-GLOBAL").unwrap();
/// assert_eq!(name.as_str(), "AS2914:AS-GLOBAL");
/// assert!(SetName::new("AS-FOO BAR").is_err());
/// assert!(SetName::new("AS15169").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct SetName(String);

impl SetName {
    /// Create a validated set name.
    pub fn new(name: impl Into<String>) -> Result<Self, ObjectError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ObjectError::InvalidSetName {
                name,
                reason: "empty name".to_string(),
            });
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ObjectError::InvalidSetName {
                name,
                reason: "contains whitespace".to_string(),
            });
        }
        if Asn::parse(&name).is_some() {
            return Err(ObjectError::InvalidSetName {
                name,
                reason: "is an AS number, not a set name".to_string(),
            });
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SetName {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SetName {
    type Error = ObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SetName> for String {
    fn from(name: SetName) -> Self {
        name.0
    }
}

impl AsRef<str> for SetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Key of the shared RASA object space.
///
/// RASA-AUTH objects for ASNs are keyed by `Asn`; RASA-SET objects and
/// RASA-AUTH objects published by AS-SETs are keyed by `Set`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum EntityId {
    /// An autonomous system.
    Asn(Asn),
    /// A named AS-SET.
    Set(SetName),
}

impl EntityId {
    /// Parse an entity identifier. ASN-shaped strings become `Asn`,
    /// anything else must be a valid set name.
    pub fn parse(s: &str) -> Result<Self, ObjectError> {
        match Asn::parse(s) {
            Some(asn) => Ok(EntityId::Asn(asn)),
            None => SetName::new(s).map(EntityId::Set),
        }
    }

    /// The ASN, if this identifies an autonomous system.
    pub fn as_asn(&self) -> Option<Asn> {
        match self {
            EntityId::Asn(asn) => Some(*asn),
            EntityId::Set(_) => None,
        }
    }

    /// The set name, if this identifies an AS-SET.
    pub fn as_set(&self) -> Option<&SetName> {
        match self {
            EntityId::Asn(_) => None,
            EntityId::Set(name) => Some(name),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Asn(asn) => asn.fmt(f),
            EntityId::Set(name) => name.fmt(f),
        }
    }
}

impl From<Asn> for EntityId {
    fn from(asn: Asn) -> Self {
        EntityId::Asn(asn)
    }
}

impl From<SetName> for EntityId {
    fn from(name: SetName) -> Self {
        EntityId::Set(name)
    }
}

impl TryFrom<String> for EntityId {
    type Error = ObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}
