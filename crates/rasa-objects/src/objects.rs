//! # RASA Objects
//!
//! The two signed declarations that share one key space:
//!
//! - **RASA-SET**: an AS-SET owner's declaration of the set's composition
//! - **RASA-AUTH**: a member's opt-in (or strict opt-out) for inclusion in
//!   named parent AS-SETs
//!
//! Records are immutable values once built. The builder methods consume
//! `self` so an object is fully formed before it is handed to a store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{ObjectError, ObjectResult};
use crate::ids::{Asn, EntityId, SetName};
use crate::scope::PropagationScope;

/// Current RASA object version.
pub const RASA_VERSION: u32 = 0;

/// Validity window `[not_before, not_after]`, inclusive on both ends.
///
/// Deserialization goes through [`Validity::new`], so an inverted window
/// is rejected wherever it appears.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawValidity")]
pub struct Validity {
    /// Start of the window.
    pub not_before: DateTime<Utc>,
    /// End of the window.
    pub not_after: DateTime<Utc>,
}

impl Validity {
    /// Create a validity window.
    ///
    /// # Errors
    ///
    /// `ObjectError::InvalidValidity` if `not_before` is after `not_after`.
    pub fn new(not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> ObjectResult<Self> {
        if not_before > not_after {
            return Err(ObjectError::InvalidValidity);
        }
        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// A window starting now and lasting `duration`.
    pub fn starting_now(duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            not_before: now,
            not_after: now + duration,
        }
    }

    /// Check whether `at` lies inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    /// Check whether the window has closed at `at`.
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at > self.not_after
    }
}

#[derive(Deserialize)]
struct RawValidity {
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl TryFrom<RawValidity> for Validity {
    type Error = ObjectError;

    fn try_from(raw: RawValidity) -> Result<Self, Self::Error> {
        Self::new(raw.not_before, raw.not_after)
    }
}

/// RASA-SET flags.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetFlags {
    /// This object is the sole source of truth; registry data is discarded.
    #[serde(default)]
    pub authoritative: bool,

    /// Referencing sets may name this set but not inherit its members.
    #[serde(default)]
    pub do_not_inherit: bool,
}

/// Authoritative declaration of an AS-SET's composition.
///
/// # Example
///
/// ```
/// use rasa_objects::{Asn, RasaSet, SetName, Validity};
/// use chrono::Duration;
///
/// let set = RasaSet::new(
///     SetName::new("AS2914:AS-GLOBAL").unwrap(),
///     Asn::new(2914),
///     Validity::starting_now(Duration::days(365)),
/// )
/// .with_members([Asn::new(64496), Asn::new(15169)])
/// .authoritative();
///
/// assert!(set.flags.authoritative);
/// assert!(set.declares_member(Asn::new(15169)));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RasaSet {
    /// Object version
    #[serde(default)]
    pub version: u32,

    /// The AS-SET this object describes
    pub name: SetName,

    /// ASN owning the set
    pub containing_as: Asn,

    /// Member ASNs
    #[serde(default)]
    pub members: BTreeSet<Asn>,

    /// Nested AS-SETs
    #[serde(default)]
    pub nested_sets: BTreeSet<SetName>,

    /// Registry the set is also published in (e.g. "RIPE")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irr_source: Option<String>,

    /// Flags
    #[serde(default)]
    pub flags: SetFlags,

    /// Validity window
    pub validity: Validity,
}

impl RasaSet {
    /// Create an empty, non-authoritative RASA-SET.
    pub fn new(name: SetName, containing_as: Asn, validity: Validity) -> Self {
        Self {
            version: RASA_VERSION,
            name,
            containing_as,
            members: BTreeSet::new(),
            nested_sets: BTreeSet::new(),
            irr_source: None,
            flags: SetFlags::default(),
            validity,
        }
    }

    /// Set the member ASNs.
    pub fn with_members<I>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = Asn>,
    {
        self.members = members.into_iter().collect();
        self
    }

    /// Set the nested AS-SETs.
    pub fn with_nested_sets<I>(mut self, nested: I) -> Self
    where
        I: IntoIterator<Item = SetName>,
    {
        self.nested_sets = nested.into_iter().collect();
        self
    }

    /// Set the registry source.
    pub fn with_irr_source(mut self, source: impl Into<String>) -> Self {
        self.irr_source = Some(source.into());
        self
    }

    /// Replace the flags.
    pub fn with_flags(mut self, flags: SetFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Mark as authoritative.
    pub fn authoritative(mut self) -> Self {
        self.flags.authoritative = true;
        self
    }

    /// Mark as do-not-inherit.
    pub fn do_not_inherit(mut self) -> Self {
        self.flags.do_not_inherit = true;
        self
    }

    /// Key under which this object is stored.
    pub fn key(&self) -> EntityId {
        EntityId::Set(self.name.clone())
    }

    /// Whether the set declares `asn` as a direct member.
    pub fn declares_member(&self, asn: Asn) -> bool {
        self.members.contains(&asn)
    }

    /// The owning authority, if the object carries a usable one.
    pub fn owner(&self) -> Option<Asn> {
        (!self.containing_as.is_reserved()).then_some(self.containing_as)
    }
}

/// The subject of a RASA-AUTH: exactly one ASN or one AS-SET.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizedEntity {
    /// An autonomous system consenting to inclusion.
    As(Asn),
    /// An AS-SET consenting to being nested.
    Set(SetName),
}

impl AuthorizedEntity {
    /// Build from the optional fields of a raw record, enforcing that
    /// exactly one is present.
    ///
    /// # Example
    ///
    /// ```
    /// use rasa_objects::{Asn, AuthorizedEntity, ObjectError};
    ///
    /// assert!(AuthorizedEntity::from_parts(Some(Asn::new(1)), None).is_ok());
    /// assert_eq!(AuthorizedEntity::from_parts(None, None), Err(ObjectError::MissingEntity));
    /// ```
    pub fn from_parts(asn: Option<Asn>, set: Option<SetName>) -> ObjectResult<Self> {
        match (asn, set) {
            (Some(asn), None) => Ok(AuthorizedEntity::As(asn)),
            (None, Some(set)) => Ok(AuthorizedEntity::Set(set)),
            (Some(_), Some(_)) => Err(ObjectError::AmbiguousEntity),
            (None, None) => Err(ObjectError::MissingEntity),
        }
    }

    /// The key this subject is stored under.
    pub fn key(&self) -> EntityId {
        match self {
            AuthorizedEntity::As(asn) => EntityId::Asn(*asn),
            AuthorizedEntity::Set(name) => EntityId::Set(name.clone()),
        }
    }
}

/// One `authorizedIn` entry: a parent set and the propagation scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AuthorizedEntry {
    /// The parent AS-SET.
    pub set: SetName,
    /// Propagation scope; unrestricted when absent.
    #[serde(default)]
    pub propagation: PropagationScope,
}

impl AuthorizedEntry {
    /// An unrestricted entry.
    pub fn unrestricted(set: SetName) -> Self {
        Self {
            set,
            propagation: PropagationScope::Unrestricted,
        }
    }

    /// A direct-only (peer-lock) entry.
    pub fn direct_only(set: SetName) -> Self {
        Self {
            set,
            propagation: PropagationScope::DirectOnly,
        }
    }
}

/// RASA-AUTH flags.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthFlags {
    /// Inclusion anywhere not listed is a security event, not a warning.
    #[serde(default)]
    pub strict_mode: bool,
}

/// Opt-in declaration by an ASN or AS-SET.
///
/// # Example
///
/// ```
/// use rasa_objects::{Asn, AuthorizedEntry, RasaAuth, SetName, Validity};
/// use chrono::Duration;
///
/// let global = SetName::new("AS2914:AS-GLOBAL").unwrap();
/// let auth = RasaAuth::for_asn(Asn::new(15169), Validity::starting_now(Duration::days(30)))
///     .with_entry(AuthorizedEntry::unrestricted(global.clone()));
///
/// assert!(auth.entry_for(&global).is_some());
/// assert!(!auth.flags.strict_mode);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RasaAuth {
    /// Object version
    #[serde(default)]
    pub version: u32,

    /// Who is consenting
    pub authorized_entity: AuthorizedEntity,

    /// Parent sets the entity consents to, in declaration order
    #[serde(default)]
    pub authorized_in: Vec<AuthorizedEntry>,

    /// Flags
    #[serde(default)]
    pub flags: AuthFlags,

    /// Validity window
    pub validity: Validity,
}

impl RasaAuth {
    /// Create a RASA-AUTH with no entries.
    pub fn new(authorized_entity: AuthorizedEntity, validity: Validity) -> Self {
        Self {
            version: RASA_VERSION,
            authorized_entity,
            authorized_in: Vec::new(),
            flags: AuthFlags::default(),
            validity,
        }
    }

    /// Create a RASA-AUTH published by an ASN.
    pub fn for_asn(asn: Asn, validity: Validity) -> Self {
        Self::new(AuthorizedEntity::As(asn), validity)
    }

    /// Create a RASA-AUTH published by an AS-SET.
    pub fn for_set(set: SetName, validity: Validity) -> Self {
        Self::new(AuthorizedEntity::Set(set), validity)
    }

    /// Append an `authorizedIn` entry.
    pub fn with_entry(mut self, entry: AuthorizedEntry) -> Self {
        self.authorized_in.push(entry);
        self
    }

    /// Append several `authorizedIn` entries.
    pub fn with_entries<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = AuthorizedEntry>,
    {
        self.authorized_in.extend(entries);
        self
    }

    /// Turn on strict mode.
    pub fn strict(mut self) -> Self {
        self.flags.strict_mode = true;
        self
    }

    /// Key under which this object is stored.
    pub fn key(&self) -> EntityId {
        self.authorized_entity.key()
    }

    /// The authorizing ASN, if the subject is an ASN.
    pub fn authorized_as(&self) -> Option<Asn> {
        match &self.authorized_entity {
            AuthorizedEntity::As(asn) if !asn.is_reserved() => Some(*asn),
            _ => None,
        }
    }

    /// First entry naming `set`, by exact match, in declaration order.
    pub fn entry_for(&self, set: &SetName) -> Option<&AuthorizedEntry> {
        self.authorized_in.iter().find(|entry| &entry.set == set)
    }

    /// Sets listed with `DirectOnly` propagation, in declaration order.
    pub fn direct_only_sets(&self) -> impl Iterator<Item = &SetName> {
        self.authorized_in
            .iter()
            .filter(|entry| entry.propagation.is_peer_lock())
            .map(|entry| &entry.set)
    }
}

/// A value in the shared RASA key space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RasaObject {
    /// A RASA-SET.
    Set(RasaSet),
    /// A RASA-AUTH.
    Auth(RasaAuth),
}

impl RasaObject {
    /// Key under which this object is stored.
    pub fn key(&self) -> EntityId {
        match self {
            RasaObject::Set(set) => set.key(),
            RasaObject::Auth(auth) => auth.key(),
        }
    }

    /// Short name of the variant, for log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            RasaObject::Set(_) => "RASA-SET",
            RasaObject::Auth(_) => "RASA-AUTH",
        }
    }

    /// Validity window of the underlying object.
    pub fn validity(&self) -> &Validity {
        match self {
            RasaObject::Set(set) => &set.validity,
            RasaObject::Auth(auth) => &auth.validity,
        }
    }
}

impl From<RasaSet> for RasaObject {
    fn from(set: RasaSet) -> Self {
        RasaObject::Set(set)
    }
}

impl From<RasaAuth> for RasaObject {
    fn from(auth: RasaAuth) -> Self {
        RasaObject::Auth(auth)
    }
}
