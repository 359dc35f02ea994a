//! Legacy registry seam
//!
//! Advisory AS-SET data as published in non-cryptographic routing
//! registries (IRR). Used as the fallback when no RASA-SET exists and as
//! merge input when a RASA-SET is not authoritative. Fetching it is the
//! caller's job.

use rasa_objects::{Asn, SetName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Declared composition of one AS-SET in a legacy registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Member ASNs
    #[serde(default)]
    pub members: BTreeSet<Asn>,

    /// Nested AS-SETs
    #[serde(default)]
    pub nested_sets: BTreeSet<SetName>,
}

impl RegistryEntry {
    /// Create an entry.
    pub fn new<M, N>(members: M, nested_sets: N) -> Self
    where
        M: IntoIterator<Item = Asn>,
        N: IntoIterator<Item = SetName>,
    {
        Self {
            members: members.into_iter().collect(),
            nested_sets: nested_sets.into_iter().collect(),
        }
    }

    /// Check if the entry declares nothing.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.nested_sets.is_empty()
    }
}

/// Source of advisory registry data.
pub trait LegacyRegistry: Send + Sync {
    /// Declared composition of `set`, if the registry knows it.
    fn lookup(&self, set: &SetName) -> Option<RegistryEntry>;
}

/// A registry that knows nothing. Every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRegistry;

impl LegacyRegistry for EmptyRegistry {
    fn lookup(&self, _set: &SetName) -> Option<RegistryEntry> {
        None
    }
}

/// In-memory registry snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    entries: HashMap<SetName, RegistryEntry>,
}

impl MemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for `set`, returning the previous one.
    pub fn insert(&mut self, set: SetName, entry: RegistryEntry) -> Option<RegistryEntry> {
        self.entries.insert(set, entry)
    }

    /// Chainable [`insert`](Self::insert).
    pub fn with_entry(mut self, set: SetName, entry: RegistryEntry) -> Self {
        self.insert(set, entry);
        self
    }

    /// Number of sets known.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze for sharing.
    pub fn freeze(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl LegacyRegistry for MemoryRegistry {
    fn lookup(&self, set: &SetName) -> Option<RegistryEntry> {
        self.entries.get(set).cloned()
    }
}
