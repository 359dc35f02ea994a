//! Snapshot documents
//!
//! A snapshot is the verified RASA feed as one JSON document:
//!
//! ```json
//! {
//!   "rasa_sets":   [{ "name": "AS2914:AS-GLOBAL", "containing_as": 2914, "members": [15169],
//!                     "authoritative": true, "not_before": "...", "not_after": "..." }],
//!   "rasa_auths":  [{ "authorized_as": 15169, "strict_mode": false,
//!                     "authorized_in": [{ "set": "AS2914:AS-GLOBAL", "propagation": "unrestricted" }],
//!                     "not_before": "...", "not_after": "..." }],
//!   "delegations": [{ "issued_by": 64496, "delegated_to": "AS2914",
//!                     "scope": ["AS64496:AS-CUSTOMERS"], "not_before": "...", "not_after": "..." }]
//! }
//! ```
//!
//! Records are decoded one at a time so a malformed record only costs
//! itself.

use chrono::{DateTime, Utc};
use rasa_objects::{
    Asn, AuthFlags, AuthorizedEntity, AuthorizedEntry, DelegationToken, RasaAuth, RasaObject,
    RasaSet, SetFlags, SetName, Validity,
};
use rasa_validator::{MemoryStore, MemoryStoreBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;
use std::sync::Arc;

use crate::error::{FeedRejection, FeedResult};

/// A frozen store together with the records that did not make it in.
#[derive(Debug)]
pub struct FeedLoad {
    /// Loaded objects and delegation tokens
    pub store: Arc<MemoryStore>,
    /// Skipped or replaced records, in document order
    pub rejected: Vec<FeedRejection>,
}

impl FeedLoad {
    /// Whether every record was loaded without incident.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    rasa_sets: Vec<serde_json::Value>,
    #[serde(default)]
    rasa_auths: Vec<serde_json::Value>,
    #[serde(default)]
    delegations: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SetRecord {
    #[serde(default)]
    version: u32,
    name: SetName,
    containing_as: Asn,
    #[serde(default)]
    members: Vec<Asn>,
    #[serde(default)]
    nested_sets: Vec<SetName>,
    #[serde(default)]
    irr_source: Option<String>,
    #[serde(default)]
    authoritative: bool,
    #[serde(default)]
    do_not_inherit: bool,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct AuthRecord {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    authorized_as: Option<Asn>,
    #[serde(default)]
    authorized_set: Option<SetName>,
    #[serde(default)]
    authorized_in: Vec<AuthorizedEntry>,
    #[serde(default)]
    strict_mode: bool,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct DelegationRecord {
    issued_by: Asn,
    delegated_to: String,
    #[serde(default)]
    scope: Vec<SetName>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl SetRecord {
    fn into_object(self) -> Result<RasaSet, String> {
        let validity = Validity::new(self.not_before, self.not_after).map_err(|e| e.to_string())?;
        let mut set = RasaSet::new(self.name, self.containing_as, validity)
            .with_members(self.members)
            .with_nested_sets(self.nested_sets)
            .with_flags(SetFlags {
                authoritative: self.authoritative,
                do_not_inherit: self.do_not_inherit,
            });
        set.version = self.version;
        if let Some(source) = self.irr_source {
            set = set.with_irr_source(source);
        }
        Ok(set)
    }
}

impl AuthRecord {
    fn into_object(self) -> Result<RasaAuth, String> {
        let entity = AuthorizedEntity::from_parts(self.authorized_as, self.authorized_set)
            .map_err(|e| e.to_string())?;
        let validity = Validity::new(self.not_before, self.not_after).map_err(|e| e.to_string())?;
        let mut auth = RasaAuth::new(entity, validity).with_entries(self.authorized_in);
        auth.version = self.version;
        auth.flags = AuthFlags {
            strict_mode: self.strict_mode,
        };
        Ok(auth)
    }
}

impl DelegationRecord {
    fn into_token(self) -> Result<DelegationToken, String> {
        if self.delegated_to.trim().is_empty() {
            return Err("delegated_to must not be empty".to_string());
        }
        let validity = Validity::new(self.not_before, self.not_after).map_err(|e| e.to_string())?;
        Ok(DelegationToken::new(
            self.issued_by,
            self.delegated_to,
            self.scope,
            validity,
        ))
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| e.to_string())
}

/// Load a snapshot document from a string.
///
/// # Errors
///
/// `FeedError::ParseError` when the text is not a JSON object with the
/// expected sections. Malformed records are reported in
/// [`FeedLoad::rejected`] instead.
///
/// # Example
///
/// ```
/// use rasa_feed::load_snapshot;
///
/// let load = load_snapshot(r#"{ "rasa_auths": [{
///     "authorized_as": 15169,
///     "authorized_in": [{ "set": "AS2914:AS-GLOBAL" }],
///     "not_before": "2025-01-01T00:00:00Z",
///     "not_after": "2027-01-01T00:00:00Z"
/// }] }"#).unwrap();
///
/// assert!(load.is_clean());
/// assert_eq!(load.store.len(), 1);
/// ```
pub fn load_snapshot(json: &str) -> FeedResult<FeedLoad> {
    let document: SnapshotDocument = serde_json::from_str(json)?;
    Ok(build(document))
}

/// Load a snapshot document from a reader.
pub fn load_snapshot_reader<R: Read>(reader: R) -> FeedResult<FeedLoad> {
    let document: SnapshotDocument = serde_json::from_reader(reader)?;
    Ok(build(document))
}

fn build(document: SnapshotDocument) -> FeedLoad {
    let mut builder = MemoryStore::builder();
    let mut rejected = Vec::new();

    for (index, value) in document.rasa_sets.into_iter().enumerate() {
        match decode::<SetRecord>(value).and_then(SetRecord::into_object) {
            Ok(set) => insert_object(&mut builder, &mut rejected, "rasa_sets", index, set.into()),
            Err(reason) => rejected.push(FeedRejection::new("rasa_sets", index, reason)),
        }
    }

    for (index, value) in document.rasa_auths.into_iter().enumerate() {
        match decode::<AuthRecord>(value).and_then(AuthRecord::into_object) {
            Ok(auth) => insert_object(&mut builder, &mut rejected, "rasa_auths", index, auth.into()),
            Err(reason) => rejected.push(FeedRejection::new("rasa_auths", index, reason)),
        }
    }

    for (index, value) in document.delegations.into_iter().enumerate() {
        match decode::<DelegationRecord>(value).and_then(DelegationRecord::into_token) {
            Ok(token) => {
                let key = token.key();
                if builder.insert_delegation(token).is_some() {
                    rejected.push(FeedRejection::new(
                        "delegations",
                        index,
                        format!("duplicate delegation {} -> {}, replaces earlier record", key.0, key.1),
                    ));
                }
            }
            Err(reason) => rejected.push(FeedRejection::new("delegations", index, reason)),
        }
    }

    let store = builder.build();
    tracing::info!(
        objects = store.len(),
        delegations = store.delegation_count(),
        rejected = rejected.len(),
        "Loaded RASA snapshot"
    );
    FeedLoad { store, rejected }
}

pub(crate) fn insert_object(
    builder: &mut MemoryStoreBuilder,
    rejected: &mut Vec<FeedRejection>,
    section: &'static str,
    index: usize,
    object: RasaObject,
) {
    let key = object.key();
    if let Some(previous) = builder.insert(object) {
        rejected.push(FeedRejection::new(
            section,
            index,
            format!("duplicate key {key}, replaces earlier {}", previous.kind()),
        ));
    }
}
