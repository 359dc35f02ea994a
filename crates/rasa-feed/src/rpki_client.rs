//! rpki-client JSON exports
//!
//! rpki-client publishes validated RASA-AUTH objects as a JSON document
//! with a `metadata` block and one `rasas[].rasa` record per object. Each
//! record becomes a RASA-AUTH valid from the export's build time until
//! its `expires` timestamp.

use chrono::{DateTime, TimeZone, Utc};
use rasa_objects::{Asn, AuthorizedEntry, PropagationScope, RasaAuth, SetName, Validity};
use rasa_validator::MemoryStore;
use serde::Deserialize;
use std::io::Read;

use crate::error::{FeedRejection, FeedResult};
use crate::snapshot::{decode, insert_object, FeedLoad};

const SECTION: &str = "rasas";

#[derive(Debug, Deserialize)]
struct Export {
    metadata: Metadata,
    #[serde(default)]
    rasas: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    buildtime: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RasaRecord {
    rasa: RasaBody,
}

#[derive(Debug, Deserialize)]
struct RasaBody {
    authorized_as: Asn,
    #[serde(default)]
    authorized_in: Vec<EntryRecord>,
    expires: i64,
    #[serde(default)]
    ta: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntryRecord {
    entry: EntryBody,
}

#[derive(Debug, Deserialize)]
struct EntryBody {
    asset: SetName,
    #[serde(default)]
    propagation: u8,
}

impl RasaBody {
    fn into_object(self, buildtime: DateTime<Utc>) -> Result<RasaAuth, String> {
        let expires = Utc
            .timestamp_opt(self.expires, 0)
            .single()
            .ok_or_else(|| format!("expires {} is out of range", self.expires))?;
        let validity = Validity::new(buildtime, expires)
            .map_err(|_| format!("expired at {expires}, before build time {buildtime}"))?;

        let entries = self
            .authorized_in
            .into_iter()
            .map(|EntryRecord { entry }| {
                PropagationScope::from_code(entry.propagation)
                    .map(|propagation| AuthorizedEntry {
                        set: entry.asset,
                        propagation,
                    })
                    .ok_or_else(|| format!("unknown propagation code {}", entry.propagation))
            })
            .collect::<Result<Vec<_>, String>>()?;

        if let Some(ta) = &self.ta {
            tracing::trace!(asn = %self.authorized_as, ta = %ta, "Decoded RASA record");
        }
        Ok(RasaAuth::for_asn(self.authorized_as, validity).with_entries(entries))
    }
}

/// Load an rpki-client JSON export from a string.
///
/// # Errors
///
/// `FeedError::ParseError` when the document or its `metadata.buildtime`
/// cannot be decoded.
///
/// # Example
///
/// ```
/// use rasa_feed::load_rpki_client;
///
/// let load = load_rpki_client(r#"{
///     "metadata": { "buildtime": "2025-06-01T00:00:00Z" },
///     "rasas": [{ "rasa": {
///         "authorized_as": 64496,
///         "authorized_in": [{ "entry": { "asset": "AS-EXAMPLE", "propagation": 0 } }],
///         "expires": 1780000000,
///         "ta": "TEST"
///     } }]
/// }"#).unwrap();
///
/// assert_eq!(load.store.len(), 1);
/// ```
pub fn load_rpki_client(json: &str) -> FeedResult<FeedLoad> {
    let export: Export = serde_json::from_str(json)?;
    Ok(build(export))
}

/// Load an rpki-client JSON export from a reader.
pub fn load_rpki_client_reader<R: Read>(reader: R) -> FeedResult<FeedLoad> {
    let export: Export = serde_json::from_reader(reader)?;
    Ok(build(export))
}

fn build(export: Export) -> FeedLoad {
    let buildtime = export.metadata.buildtime;
    let mut builder = MemoryStore::builder();
    let mut rejected = Vec::new();

    for (index, value) in export.rasas.into_iter().enumerate() {
        let decoded = decode::<RasaRecord>(value).and_then(|record| record.rasa.into_object(buildtime));
        match decoded {
            Ok(auth) => insert_object(&mut builder, &mut rejected, SECTION, index, auth.into()),
            Err(reason) => rejected.push(FeedRejection::new(SECTION, index, reason)),
        }
    }

    let store = builder.build();
    tracing::info!(
        buildtime = %buildtime,
        objects = store.len(),
        rejected = rejected.len(),
        "Loaded rpki-client RASA export"
    );
    FeedLoad { store, rejected }
}
