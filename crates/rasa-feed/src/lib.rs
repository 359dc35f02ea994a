//! # RASA Feed
//!
//! Loaders that turn verified RASA feed documents and legacy registry data
//! into the frozen, shareable snapshots the validator reads.
//!
//! ## Overview
//!
//! The rasa-feed crate handles:
//! - **Snapshots**: the full feed (`rasa_sets`, `rasa_auths`, `delegations`) as JSON
//! - **rpki-client exports**: validated RASA-AUTH objects as published by rpki-client
//! - **Registry data**: advisory AS-SET composition as JSON or RPSL `as-set` objects
//!
//! Signature verification happens upstream; everything handed to these
//! loaders is assumed verified.
//!
//! ## Rejections
//!
//! A malformed record never fails the whole load. It is skipped and
//! reported as a [`FeedRejection`] with its section and index, and its
//! well-formed siblings are still loaded. When two records share a key,
//! the later one wins and is reported.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rasa_feed::{load_snapshot, parse_rpsl};
//! use rasa_objects::SetName;
//! use rasa_validator::RasaValidator;
//!
//! let feed = load_snapshot(&std::fs::read_to_string("rasa-snapshot.json").unwrap()).unwrap();
//! let irr = parse_rpsl(&std::fs::read_to_string("as-sets.rpsl").unwrap());
//!
//! for rejection in feed.rejected.iter().chain(&irr.rejected) {
//!     eprintln!("{}[{}]: {}", rejection.section, rejection.index, rejection.reason);
//! }
//!
//! let mut validator = RasaValidator::new(feed.store).with_registry(irr.registry);
//! let expansion = validator.expand(&SetName::new("AS2914:AS-GLOBAL").unwrap());
//! println!("{} members", expansion.members.len());
//! ```

pub mod error;
pub mod registry;
pub mod rpki_client;
pub mod snapshot;

// Re-export main types
pub use error::{FeedError, FeedRejection, FeedResult};
pub use registry::{load_registry_json, parse_rpsl, RegistryLoad};
pub use rpki_client::{load_rpki_client, load_rpki_client_reader};
pub use snapshot::{load_snapshot, load_snapshot_reader, FeedLoad};
