//! # RASA Validator
//!
//! Authorization engine for RPKI AS-SET Authorization. Given a frozen
//! store of verified RASA objects, it decides whether members and nested
//! sets may be included in an AS-SET, whether a publisher was entitled to
//! publish an object, and expands sets into their authorized membership.
//!
//! ## Overview
//!
//! The rasa-validator crate handles:
//! - **Member consent**: `check_member_auth` against an ASN's RASA-AUTH
//! - **Nested-set consent**: `check_asset_set_auth` against a set's RASA-AUTH
//! - **Delegation**: `validate_delegation` for direct and delegated publishers
//! - **Peer-lock**: `get_peer_lock_sets` projection of `DirectOnly` entries
//! - **Expansion**: cycle- and depth-bounded walk of nested sets
//! - **Decision log**: one ordered audit entry per decision
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rasa_objects::{Asn, AuthorizedEntry, RasaAuth, SetName, Validity};
//! use rasa_validator::{MemoryRegistry, MemoryStore, RasaValidator, RegistryEntry};
//! use chrono::Duration;
//!
//! let global = SetName::new("AS2914:AS-GLOBAL").unwrap();
//! let store = MemoryStore::builder()
//!     .with_object(
//!         RasaAuth::for_asn(Asn::new(15169), Validity::starting_now(Duration::days(365)))
//!             .with_entry(AuthorizedEntry::unrestricted(global.clone())),
//!     )
//!     .build();
//! let registry = MemoryRegistry::new()
//!     .with_entry(global.clone(), RegistryEntry::new([Asn::new(15169)], Vec::<SetName>::new()));
//!
//! let mut validator = RasaValidator::new(store).with_registry(registry.freeze());
//! let expansion = validator.expand(&global);
//!
//! assert!(expansion.contains(Asn::new(15169)));
//! for entry in validator.log() {
//!     println!("{} {} {}", entry.kind, entry.subject, entry.reason);
//! }
//! ```
//!
//! ## Sessions
//!
//! A `RasaValidator` is one session: it owns its `DecisionLog` and
//! evaluation time. The store is shared read-only behind an `Arc`, so any
//! number of sessions may run concurrently over the same snapshot.

pub mod config;
pub mod decision;
pub mod error;
pub mod expansion;
pub mod log;
pub mod registry;
pub mod store;
pub mod validator;

// Re-export main types
pub use config::{ConfigError, ValidatorConfig, DEFAULT_MAX_DEPTH};
pub use decision::{BidirectionalCheck, Decision, DelegationBasis, DelegationDecision};
pub use error::{RasaError, RasaResult};
pub use expansion::{Expansion, Visited};
pub use log::{DecisionKind, DecisionLog, DecisionLogEntry, LogSummary, Severity};
pub use registry::{EmptyRegistry, LegacyRegistry, MemoryRegistry, RegistryEntry};
pub use store::{AuthorizationStore, MemoryStore, MemoryStoreBuilder};
pub use validator::{MemberFilter, RasaValidator};
