//! # RASA Objects
//!
//! Value records for RPKI AS-SET Authorization (RASA), shared by the
//! validator and the feed loaders.
//!
//! ## Overview
//!
//! The rasa-objects crate defines:
//! - **Identifiers**: `Asn`, `SetName`, and the `EntityId` key
//! - **RASA-SET**: an owner's declaration of a set's members and nested sets
//! - **RASA-AUTH**: a member's consent to inclusion in named parent sets
//! - **Delegation tokens**: grants to publish on behalf of an owner
//!
//! ## Key Space
//!
//! ```text
//! EntityId::Asn(AS15169)           -> RasaObject::Auth(..)
//! EntityId::Set(AS2914:AS-GLOBAL)  -> RasaObject::Set(..) | RasaObject::Auth(..)
//! (issuer ASN, delegate id)        -> DelegationToken
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rasa_objects::{Asn, AuthorizedEntry, RasaAuth, RasaSet, SetName, Validity};
//! use chrono::Duration;
//!
//! let global = SetName::new("AS2914:AS-GLOBAL").unwrap();
//! let validity = Validity::starting_now(Duration::days(365));
//!
//! let set = RasaSet::new(global.clone(), Asn::new(2914), validity)
//!     .with_members([Asn::new(64496), Asn::new(15169)])
//!     .authoritative();
//!
//! let consent = RasaAuth::for_asn(Asn::new(15169), validity)
//!     .with_entry(AuthorizedEntry::unrestricted(global));
//! ```
//!
//! Objects handed to this crate are assumed to be signature-verified
//! already; nothing here touches cryptography.

pub mod delegation;
pub mod error;
pub mod ids;
pub mod objects;
pub mod scope;

// Re-export main types for convenience
pub use delegation::DelegationToken;
pub use error::{ObjectError, ObjectResult};
pub use ids::{Asn, EntityId, SetName};
pub use objects::{
    AuthFlags, AuthorizedEntity, AuthorizedEntry, RasaAuth, RasaObject, RasaSet, SetFlags,
    Validity, RASA_VERSION,
};
pub use scope::PropagationScope;
