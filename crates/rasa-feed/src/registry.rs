//! Legacy registry data
//!
//! Two input shapes for advisory AS-SET composition:
//! - a JSON snapshot keyed by set name
//! - RPSL `as-set` objects as served by IRR whois
//!
//! In both, a member may be an ASN or another set; ASNs land in
//! `members` and set names in `nested_sets`.

use rasa_objects::{EntityId, SetName};
use rasa_validator::{MemoryRegistry, RegistryEntry};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{FeedRejection, FeedResult};
use crate::snapshot::decode;

/// A frozen registry together with the entries that did not make it in.
#[derive(Debug)]
pub struct RegistryLoad {
    /// Loaded set compositions
    pub registry: Arc<MemoryRegistry>,
    /// Skipped or replaced entries
    pub rejected: Vec<FeedRejection>,
}

impl RegistryLoad {
    /// Whether every entry was loaded without incident.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct SetRecord {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    nested_sets: Vec<String>,
}

fn add_member(entry: &mut RegistryEntry, member: &str) -> Result<(), String> {
    match EntityId::parse(member).map_err(|e| e.to_string())? {
        EntityId::Asn(asn) => {
            entry.members.insert(asn);
        }
        EntityId::Set(set) => {
            entry.nested_sets.insert(set);
        }
    }
    Ok(())
}

impl SetRecord {
    fn into_entry(self) -> Result<RegistryEntry, String> {
        let mut entry = RegistryEntry::default();
        for member in &self.members {
            add_member(&mut entry, member)?;
        }
        for nested in self.nested_sets {
            let set = SetName::new(nested).map_err(|e| e.to_string())?;
            entry.nested_sets.insert(set);
        }
        Ok(entry)
    }
}

/// Load a registry snapshot of the form
/// `{ "<set>": { "members": ["AS1", "AS-OTHER"], "nested_sets": [...] } }`.
///
/// Entries are indexed in key order.
///
/// # Errors
///
/// `FeedError::ParseError` when the text is not a JSON object.
pub fn load_registry_json(json: &str) -> FeedResult<RegistryLoad> {
    let document: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
    let mut registry = MemoryRegistry::new();
    let mut rejected = Vec::new();

    for (index, (name, value)) in document.into_iter().enumerate() {
        let loaded = SetName::new(name.as_str())
            .map_err(|e| e.to_string())
            .and_then(|set| Ok((set, decode::<SetRecord>(value)?.into_entry()?)));
        match loaded {
            Ok((set, entry)) => {
                registry.insert(set, entry);
            }
            Err(reason) => {
                rejected.push(FeedRejection::new("registry", index, format!("{name}: {reason}")))
            }
        }
    }

    tracing::info!(
        sets = registry.len(),
        rejected = rejected.len(),
        "Loaded registry snapshot"
    );
    Ok(RegistryLoad {
        registry: registry.freeze(),
        rejected,
    })
}

/// Parse RPSL text containing `as-set` objects.
///
/// Objects are separated by blank lines. Attribute names are matched
/// case-insensitively, `#` starts a comment, and a line starting with
/// whitespace or `+` continues the previous attribute. `members:` values
/// are split on commas and whitespace. Objects of other classes are
/// ignored; a repeated set replaces the earlier one and is reported.
///
/// # Example
///
/// ```
/// use rasa_feed::parse_rpsl;
/// use rasa_objects::{Asn, SetName};
/// use rasa_validator::LegacyRegistry;
///
/// let load = parse_rpsl("\
/// as-set:   AS-EXAMPLE
/// members:  AS64496, AS64497 # transit
///           AS-CUSTOMERS
/// source:   RIPE
/// ");
///
/// let entry = load.registry.lookup(&SetName::new("AS-EXAMPLE").unwrap()).unwrap();
/// assert!(entry.members.contains(&Asn::new(64497)));
/// assert_eq!(entry.nested_sets.len(), 1);
/// ```
pub fn parse_rpsl(text: &str) -> RegistryLoad {
    let mut registry = MemoryRegistry::new();
    let mut rejected = Vec::new();

    for (index, object) in rpsl_objects(text).into_iter().enumerate() {
        let Some(name) = object.first_value("as-set") else {
            continue;
        };

        let loaded = SetName::new(name).map_err(|e| e.to_string()).and_then(|set| {
            let mut entry = RegistryEntry::default();
            for value in object.values("members") {
                for member in value.split(|c: char| c == ',' || c.is_whitespace()) {
                    if !member.is_empty() {
                        add_member(&mut entry, member)?;
                    }
                }
            }
            Ok((set, entry))
        });

        match loaded {
            Ok((set, entry)) => {
                let replaced = registry.insert(set.clone(), entry);
                if replaced.is_some() {
                    rejected.push(FeedRejection::new(
                        "rpsl",
                        index,
                        format!("duplicate as-set {set}, replaces earlier object"),
                    ));
                }
            }
            Err(reason) => {
                rejected.push(FeedRejection::new("rpsl", index, format!("{name}: {reason}")))
            }
        }
    }

    tracing::info!(
        sets = registry.len(),
        rejected = rejected.len(),
        "Parsed RPSL as-set objects"
    );
    RegistryLoad {
        registry: registry.freeze(),
        rejected,
    }
}

/// One RPSL object as `(attribute, value)` pairs, continuations folded in.
#[derive(Debug, Default)]
struct RpslObject {
    attributes: Vec<(String, String)>,
}

impl RpslObject {
    fn values<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a str> {
        self.attributes
            .iter()
            .filter(move |(name, _)| name == attribute)
            .map(|(_, value)| value.as_str())
    }

    fn first_value<'a>(&'a self, attribute: &'a str) -> Option<&'a str> {
        self.values(attribute).next()
    }
}

fn rpsl_objects(text: &str) -> Vec<RpslObject> {
    let mut objects = Vec::new();
    let mut current = RpslObject::default();

    for raw in text.lines() {
        let line = raw.split('#').next().unwrap_or_default();

        if raw.trim().is_empty() {
            if !current.attributes.is_empty() {
                objects.push(std::mem::take(&mut current));
            }
            continue;
        }

        let continuation = raw.starts_with(|c: char| c.is_whitespace() || c == '+');
        if continuation {
            if let Some((_, value)) = current.attributes.last_mut() {
                let extra = line.trim_start_matches('+').trim();
                if !extra.is_empty() {
                    value.push(' ');
                    value.push_str(extra);
                }
            }
            continue;
        }

        if let Some((name, value)) = line.split_once(':') {
            current
                .attributes
                .push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    if !current.attributes.is_empty() {
        objects.push(current);
    }
    objects
}
