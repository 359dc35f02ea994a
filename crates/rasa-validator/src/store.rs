//! Authorization store
//!
//! Read-only lookup of RASA objects and delegation tokens. A store is
//! populated once per session by the feed collaborator, then frozen and
//! shared behind an `Arc`; the validator never mutates it.

use rasa_objects::{Asn, DelegationToken, EntityId, RasaAuth, RasaObject, RasaSet, SetName};
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only view of the verified authorization feed.
///
/// Implementations must be safe to share between concurrent validation
/// sessions.
pub trait AuthorizationStore: Send + Sync {
    /// Object stored under `id`, whatever its variant.
    fn lookup_object(&self, id: &EntityId) -> Option<&RasaObject>;

    /// Delegation token issued by `issuer` to `delegate`. ASN-shaped
    /// delegates match in any spelling, see [`DelegationToken::delegate_key`].
    fn lookup_delegation(&self, issuer: Asn, delegate: &str) -> Option<&DelegationToken>;

    /// RASA-SET for `name`, if the object stored there is one.
    fn lookup_set(&self, name: &SetName) -> Option<&RasaSet> {
        match self.lookup_object(&EntityId::Set(name.clone())) {
            Some(RasaObject::Set(set)) => Some(set),
            _ => None,
        }
    }

    /// RASA-AUTH for `id`, if the object stored there is one.
    fn lookup_auth(&self, id: &EntityId) -> Option<&RasaAuth> {
        match self.lookup_object(id) {
            Some(RasaObject::Auth(auth)) => Some(auth),
            _ => None,
        }
    }
}

/// In-memory snapshot store.
///
/// Built with [`MemoryStoreBuilder`] and frozen into an `Arc`. There is no
/// mutation API once built.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: HashMap<EntityId, RasaObject>,
    delegations: HashMap<(Asn, String), DelegationToken>,
}

impl MemoryStore {
    /// Start building a store.
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }

    /// An empty, frozen store.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of delegation tokens.
    pub fn delegation_count(&self) -> usize {
        self.delegations.len()
    }

    /// Iterate over stored keys.
    pub fn keys(&self) -> impl Iterator<Item = &EntityId> {
        self.objects.keys()
    }
}

impl AuthorizationStore for MemoryStore {
    fn lookup_object(&self, id: &EntityId) -> Option<&RasaObject> {
        self.objects.get(id)
    }

    fn lookup_delegation(&self, issuer: Asn, delegate: &str) -> Option<&DelegationToken> {
        self.delegations
            .get(&(issuer, DelegationToken::delegate_key(delegate)))
    }
}

/// Populates a [`MemoryStore`].
///
/// # Example
///
/// ```
/// use rasa_objects::{Asn, AuthorizedEntry, EntityId, RasaAuth, SetName, Validity};
/// use rasa_validator::{AuthorizationStore, MemoryStore};
/// use chrono::Duration;
///
/// let auth = RasaAuth::for_asn(Asn::new(15169), Validity::starting_now(Duration::days(1)))
///     .with_entry(AuthorizedEntry::unrestricted(SetName::new("AS-GOOGLE").unwrap()));
///
/// let store = MemoryStore::builder().with_object(auth).build();
/// assert!(store.lookup_auth(&EntityId::Asn(Asn::new(15169))).is_some());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStoreBuilder {
    store: MemoryStore,
}

impl MemoryStoreBuilder {
    /// Insert an object under its own key, returning any replaced object.
    pub fn insert(&mut self, object: impl Into<RasaObject>) -> Option<RasaObject> {
        let object = object.into();
        self.store.objects.insert(object.key(), object)
    }

    /// Insert an object under an externally supplied key.
    ///
    /// The feed maps entity identifiers to objects; the key is not checked
    /// against the object here. The validator reports a disagreement as an
    /// invalid object when it is consulted.
    pub fn insert_at(&mut self, key: EntityId, object: impl Into<RasaObject>) -> Option<RasaObject> {
        self.store.objects.insert(key, object.into())
    }

    /// Insert a delegation token, returning any replaced token.
    pub fn insert_delegation(&mut self, token: DelegationToken) -> Option<DelegationToken> {
        self.store.delegations.insert(token.key(), token)
    }

    /// Chainable [`insert`](Self::insert).
    pub fn with_object(mut self, object: impl Into<RasaObject>) -> Self {
        self.insert(object);
        self
    }

    /// Chainable [`insert_delegation`](Self::insert_delegation).
    pub fn with_delegation(mut self, token: DelegationToken) -> Self {
        self.insert_delegation(token);
        self
    }

    /// Number of objects inserted so far.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Freeze the store for sharing.
    pub fn build(self) -> Arc<MemoryStore> {
        Arc::new(self.store)
    }
}
