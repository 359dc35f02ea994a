//! RASA validator
//!
//! The decision primitives: member consent, nested-set consent,
//! delegation checks and the peer-lock projection. Every decision except
//! the projection is appended to the session's [`DecisionLog`].
//!
//! # Default allow
//!
//! An entity that has published no RASA-AUTH has expressed no opinion, and
//! no opinion means inclusion. This keeps partial deployment working: a
//! set only loses members whose owners have explicitly said otherwise.

use chrono::{DateTime, Utc};
use rasa_objects::{Asn, EntityId, RasaAuth, RasaObject, SetName};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::instrument;

use crate::config::ValidatorConfig;
use crate::decision::{BidirectionalCheck, Decision, DelegationBasis, DelegationDecision};
use crate::error::{RasaError, RasaResult};
use crate::log::{DecisionKind, DecisionLog, Severity};
use crate::registry::{EmptyRegistry, LegacyRegistry};
use crate::store::AuthorizationStore;

const DEFAULT_ALLOW: &str = "No RASA-AUTH (default allow)";
const DEFAULT_ALLOW_SET: &str = "No RASA-AUTH for AS-SET (default allow)";

/// Members of one set split by consent outcome.
#[derive(Debug, Clone, Default)]
pub struct MemberFilter {
    /// Members whose inclusion is authorized
    pub authorized: BTreeSet<Asn>,
    /// Rejected members and the decision that rejected them
    pub rejected: BTreeMap<Asn, Decision>,
}

/// One validation session over a shared, read-only store.
///
/// A validator owns its decision log and its evaluation time, so several
/// validators may run concurrently against the same store.
///
/// # Example
///
/// ```
/// use rasa_objects::{Asn, SetName};
/// use rasa_validator::{MemoryStore, RasaValidator};
///
/// let mut validator = RasaValidator::new(MemoryStore::empty());
/// let decision = validator.check_member_auth(Asn::new(64496), &SetName::new("AS-ANY").unwrap());
///
/// assert!(decision.authorized);
/// assert_eq!(validator.log().len(), 1);
/// ```
pub struct RasaValidator {
    pub(crate) store: Arc<dyn AuthorizationStore>,
    pub(crate) registry: Arc<dyn LegacyRegistry>,
    pub(crate) config: ValidatorConfig,
    pub(crate) now: DateTime<Utc>,
    pub(crate) log: DecisionLog,
}

impl std::fmt::Debug for RasaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasaValidator")
            .field("session_id", &self.log.session_id())
            .field("config", &self.config)
            .field("now", &self.now)
            .field("decisions", &self.log.len())
            .finish()
    }
}

impl RasaValidator {
    /// Start a session against `store`, evaluated at the current time,
    /// with no legacy registry and default configuration.
    pub fn new(store: Arc<dyn AuthorizationStore>) -> Self {
        Self {
            store,
            registry: Arc::new(EmptyRegistry),
            config: ValidatorConfig::default(),
            now: Utc::now(),
            log: DecisionLog::new(),
        }
    }

    /// Use `registry` for advisory set data.
    pub fn with_registry(mut self, registry: Arc<dyn LegacyRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Evaluate time-dependent checks at `now` instead of the wall clock.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Time used for delegation validity checks.
    pub fn evaluation_time(&self) -> DateTime<Utc> {
        self.now
    }

    /// Active configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Decisions recorded so far.
    pub fn log(&self) -> &DecisionLog {
        &self.log
    }

    /// End the session and hand over the log.
    pub fn into_log(self) -> DecisionLog {
        self.log
    }

    /// Check whether `asn` consents to being a member of `target`.
    ///
    /// Appends exactly one entry to the log.
    pub fn check_member_auth(&mut self, asn: Asn, target: &SetName) -> Decision {
        self.check_consent(DecisionKind::MemberAuth, EntityId::Asn(asn), target)
    }

    /// Check whether `nested` consents to being referenced by `parent`.
    ///
    /// A RASA-SET stored under the nested set's name is not a consent
    /// object and counts as none found. Appends exactly one entry.
    pub fn check_asset_set_auth(&mut self, nested: &SetName, parent: &SetName) -> Decision {
        self.check_consent(
            DecisionKind::NestedSetAuth,
            EntityId::Set(nested.clone()),
            parent,
        )
    }

    fn check_consent(&mut self, kind: DecisionKind, subject: EntityId, target: &SetName) -> Decision {
        let decision = match self.store.lookup_object(&subject) {
            None => Decision::allow(DEFAULT_ALLOW),
            Some(RasaObject::Set(_)) if subject.as_set().is_some() => {
                Decision::allow(DEFAULT_ALLOW_SET)
            }
            Some(RasaObject::Set(_)) => invalid_object(&subject, "RASA-SET stored under an AS number"),
            Some(RasaObject::Auth(auth)) if auth.key() != subject => invalid_object(
                &subject,
                format!("RASA-AUTH for {} stored under {}", auth.key(), subject),
            ),
            Some(RasaObject::Auth(auth)) => consent(auth, target),
        };
        self.log
            .record(kind, subject, Some(target.clone()), &decision);
        decision
    }

    /// Check that `signer` may publish `object`.
    ///
    /// The signer is accepted when it is the object's owning authority, or
    /// holds a delegation token from that authority which is current at
    /// the evaluation time and, when scope enforcement is on, covers the
    /// object.
    ///
    /// # Errors
    ///
    /// `RasaError::InvalidObject` when the object carries no owning AS
    /// (a RASA-SET owned by AS0, or a RASA-AUTH published by an AS-SET).
    /// The failure is logged like any other decision.
    #[instrument(level = "debug", skip(self, object), fields(object = %object.key()))]
    pub fn validate_delegation(
        &mut self,
        object: &RasaObject,
        signer: &str,
    ) -> RasaResult<DelegationDecision> {
        let subject = object.key();
        let (owner, target, covered) = match object {
            RasaObject::Set(set) => (set.owner(), Some(set.name.clone()), vec![set.name.clone()]),
            RasaObject::Auth(auth) => (
                auth.authorized_as(),
                None,
                auth.authorized_in.iter().map(|entry| entry.set.clone()).collect(),
            ),
        };

        let Some(owner) = owner else {
            let fault = RasaError::invalid_object(
                &subject,
                format!("{} has no owning AS", object.kind()),
            );
            let decision = Decision::from_fault(&fault, "REJECTED", Severity::Warning);
            self.log
                .record(DecisionKind::Delegation, subject, target, &decision);
            return Err(fault);
        };

        let (basis, decision) = self.delegation_outcome(owner, signer, &covered);
        self.log
            .record(DecisionKind::Delegation, subject, target, &decision);

        Ok(DelegationDecision {
            valid: decision.authorized,
            basis,
            reason: decision.reason,
        })
    }

    fn delegation_outcome(
        &self,
        owner: Asn,
        signer: &str,
        covered: &[SetName],
    ) -> (DelegationBasis, Decision) {
        if Asn::parse(signer) == Some(owner) {
            return (
                DelegationBasis::Direct,
                Decision::allow(format!("direct: published by owning authority {owner}")),
            );
        }

        let Some(token) = self.store.lookup_delegation(owner, signer) else {
            let fault = RasaError::NotFound(format!("delegation token from {owner} to {signer}"));
            return (
                DelegationBasis::NoDelegation,
                Decision::from_fault(&fault, "no delegation", Severity::SecurityEvent),
            );
        };

        if !token.is_current(self.now) {
            let fault = RasaError::ExpiredDelegation {
                issuer: owner,
                delegate: signer.to_string(),
                not_before: token.validity.not_before,
                not_after: token.validity.not_after,
            };
            return (
                DelegationBasis::Expired,
                Decision::from_fault(&fault, "expired", Severity::Warning),
            );
        }

        if self.config.enforce_delegation_scope {
            if let Some(outside) = covered.iter().find(|set| !token.covers(set)) {
                let fault = RasaError::DelegationOutOfScope {
                    issuer: owner,
                    delegate: signer.to_string(),
                    set: outside.clone(),
                };
                return (
                    DelegationBasis::OutOfScope,
                    Decision::from_fault(&fault, "out of scope", Severity::SecurityEvent),
                );
            }
        }

        (
            DelegationBasis::Delegated,
            Decision::allow(format!("delegated: {owner} authorized {signer} to publish")),
        )
    }

    /// Sets in which `asn` asked for `DirectOnly` propagation.
    ///
    /// Routes for `asn` inside these sets should only be accepted from
    /// direct sessions. Pure projection; nothing is logged.
    pub fn get_peer_lock_sets(&self, asn: Asn) -> Vec<SetName> {
        let key = EntityId::Asn(asn);
        match self.store.lookup_auth(&key) {
            Some(auth) if auth.key() == key => auth.direct_only_sets().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Run [`check_member_auth`](Self::check_member_auth) over every
    /// candidate and split the results.
    pub fn filter_members<I>(&mut self, set: &SetName, candidates: I) -> MemberFilter
    where
        I: IntoIterator<Item = Asn>,
    {
        let mut filter = MemberFilter::default();
        for asn in candidates {
            let decision = self.check_member_auth(asn, set);
            if decision.authorized {
                filter.authorized.insert(asn);
            } else {
                filter.rejected.insert(asn, decision);
            }
        }
        filter
    }

    /// Check both sides of "`asn` is a member of `set`": the owner's
    /// RASA-SET declaration and the member's consent.
    pub fn verify_bidirectional(&mut self, set: &SetName, asn: Asn) -> BidirectionalCheck {
        let declared = self
            .store
            .lookup_set(set)
            .map(|rasa_set| rasa_set.declares_member(asn));
        let consent = self.check_member_auth(asn, set);
        BidirectionalCheck { declared, consent }
    }
}

fn consent(auth: &RasaAuth, target: &SetName) -> Decision {
    if let Some(entry) = auth.entry_for(target) {
        return Decision::allow(format!("Authorized ({})", entry.propagation))
            .with_propagation(entry.propagation);
    }

    if auth.flags.strict_mode {
        Decision::deny(
            format!("REJECTED: strictMode=TRUE, {target} not in authorizedIn"),
            Severity::SecurityEvent,
        )
    } else {
        Decision::deny(
            format!("REJECTED: {target} not in authorizedIn"),
            Severity::Warning,
        )
    }
}

fn invalid_object(subject: &EntityId, reason: impl Into<String>) -> Decision {
    let fault = RasaError::invalid_object(subject, reason);
    Decision::from_fault(&fault, "REJECTED", Severity::Warning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;
    use rasa_objects::{
        AuthorizedEntry, DelegationToken, PropagationScope, RasaSet, Validity,
    };

    fn name(s: &str) -> SetName {
        SetName::new(s).unwrap()
    }

    fn year() -> Validity {
        Validity::starting_now(Duration::days(365))
    }

    fn google_store() -> Arc<MemoryStore> {
        MemoryStore::builder()
            .with_object(
                RasaAuth::for_asn(Asn::new(15169), year()).with_entries([
                    AuthorizedEntry::unrestricted(name("AS2914:AS-GLOBAL")),
                    AuthorizedEntry::direct_only(name("AS1299:AS-TWELVE99")),
                ]),
            )
            .with_object(
                RasaAuth::for_asn(Asn::new(64511), year())
                    .with_entry(AuthorizedEntry::unrestricted(name("AS-TRUSTED")))
                    .strict(),
            )
            .build()
    }

    #[test]
    fn test_default_allow() {
        let mut validator = RasaValidator::new(google_store());
        let decision = validator.check_member_auth(Asn::new(64496), &name("AS-ANY"));

        assert!(decision.authorized);
        assert!(decision.reason.contains("default allow"));
        assert_eq!(decision.severity, Severity::Info);
        assert_eq!(validator.log().len(), 1);
    }

    #[test]
    fn test_match_reports_propagation() {
        let mut validator = RasaValidator::new(google_store());
        let decision = validator.check_member_auth(Asn::new(15169), &name("AS1299:AS-TWELVE99"));

        assert!(decision.authorized);
        assert_eq!(decision.propagation, Some(PropagationScope::DirectOnly));
        assert!(decision.reason.contains("direct_only"));
    }

    #[test]
    fn test_rejection_severity_follows_strict_mode() {
        let mut validator = RasaValidator::new(google_store());

        let soft = validator.check_member_auth(Asn::new(15169), &name("AS-EVIL:CUSTOMERS"));
        assert!(!soft.authorized);
        assert_eq!(soft.severity, Severity::Warning);

        let hard = validator.check_member_auth(Asn::new(64511), &name("AS-EVIL:CUSTOMERS"));
        assert!(!hard.authorized);
        assert!(hard.is_security_event());
        assert!(hard.reason.contains("strictMode"));

        assert_eq!(validator.log().len(), 2);
        assert_eq!(validator.log().security_events().count(), 1);
    }

    #[test]
    fn test_nested_set_with_rasa_set_is_default_allow() {
        let store = MemoryStore::builder()
            .with_object(RasaSet::new(name("AS-CHILD"), Asn::new(64500), year()))
            .build();
        let mut validator = RasaValidator::new(store);

        let decision = validator.check_asset_set_auth(&name("AS-CHILD"), &name("AS-PARENT"));
        assert!(decision.authorized);
        assert_eq!(decision.reason, DEFAULT_ALLOW_SET);
        assert_eq!(validator.log().count_of(DecisionKind::NestedSetAuth), 1);
    }

    #[test]
    fn test_nested_set_consent() {
        let store = MemoryStore::builder()
            .with_object(
                RasaAuth::for_set(name("AS-CHILD"), year())
                    .with_entry(AuthorizedEntry::unrestricted(name("AS-PARENT")))
                    .strict(),
            )
            .build();
        let mut validator = RasaValidator::new(store);

        assert!(validator
            .check_asset_set_auth(&name("AS-CHILD"), &name("AS-PARENT"))
            .authorized);
        let denied = validator.check_asset_set_auth(&name("AS-CHILD"), &name("AS-HIJACK"));
        assert!(!denied.authorized);
        assert_eq!(denied.severity, Severity::SecurityEvent);
    }

    #[test]
    fn test_misfiled_objects_are_invalid() {
        let mut builder = MemoryStore::builder();
        builder.insert_at(
            EntityId::Asn(Asn::new(7)),
            RasaSet::new(name("AS-MISFILED"), Asn::new(7), year()),
        );
        builder.insert_at(
            EntityId::Asn(Asn::new(8)),
            RasaAuth::for_asn(Asn::new(9), year()),
        );
        let mut validator = RasaValidator::new(builder.build());

        let first = validator.check_member_auth(Asn::new(7), &name("AS-A"));
        assert!(!first.authorized);
        assert_eq!(first.fault, Some("INVALID_OBJECT"));

        let second = validator.check_member_auth(Asn::new(8), &name("AS-A"));
        assert!(!second.authorized);
        assert!(second.reason.contains("stored under AS8"));

        // Siblings are unaffected.
        assert!(validator.check_member_auth(Asn::new(10), &name("AS-A")).authorized);
        assert_eq!(validator.log().len(), 3);
    }

    #[test]
    fn test_peer_lock_projection_does_not_log() {
        let validator = RasaValidator::new(google_store());

        assert_eq!(
            validator.get_peer_lock_sets(Asn::new(15169)),
            vec![name("AS1299:AS-TWELVE99")]
        );
        assert!(validator.get_peer_lock_sets(Asn::new(1)).is_empty());
        assert!(validator.log().is_empty());
    }

    #[test]
    fn test_filter_members() {
        let mut validator = RasaValidator::new(google_store());
        let filter = validator.filter_members(
            &name("AS-EVIL:CUSTOMERS"),
            [Asn::new(15169), Asn::new(64496), Asn::new(64511)],
        );

        assert_eq!(filter.authorized, BTreeSet::from([Asn::new(64496)]));
        assert_eq!(filter.rejected.len(), 2);
        assert!(filter.rejected[&Asn::new(64511)].is_security_event());
    }

    #[test]
    fn test_verify_bidirectional() {
        let store = MemoryStore::builder()
            .with_object(
                RasaSet::new(name("AS2914:AS-GLOBAL"), Asn::new(2914), year())
                    .with_members([Asn::new(15169)]),
            )
            .with_object(
                RasaAuth::for_asn(Asn::new(15169), year())
                    .with_entry(AuthorizedEntry::unrestricted(name("AS2914:AS-GLOBAL"))),
            )
            .build();
        let mut validator = RasaValidator::new(store);

        let both = validator.verify_bidirectional(&name("AS2914:AS-GLOBAL"), Asn::new(15169));
        assert_eq!(both.declared, Some(true));
        assert!(both.passes());

        let undeclared = validator.verify_bidirectional(&name("AS2914:AS-GLOBAL"), Asn::new(64496));
        assert_eq!(undeclared.declared, Some(false));
        assert!(!undeclared.passes());

        let unknown = validator.verify_bidirectional(&name("AS-NO-RASA"), Asn::new(64496));
        assert_eq!(unknown.declared, None);
        assert!(unknown.passes());
    }

    fn delegation_fixture(t0: DateTime<Utc>, t1: DateTime<Utc>) -> (Arc<MemoryStore>, RasaObject) {
        let customers = name("AS64496:AS-CUSTOMERS");
        let store = MemoryStore::builder()
            .with_delegation(DelegationToken::new(
                Asn::new(64496),
                "AS2914",
                vec![customers.clone()],
                Validity::new(t0, t1).unwrap(),
            ))
            .build();
        let object = RasaSet::new(customers, Asn::new(64496), Validity::new(t0, t1).unwrap()).into();
        (store, object)
    }

    #[test]
    fn test_delegation_direct_and_delegated() {
        let t0 = Utc::now();
        let (store, object) = delegation_fixture(t0, t0 + Duration::days(30));
        let mut validator = RasaValidator::new(store).at(t0 + Duration::days(1));

        let direct = validator.validate_delegation(&object, "AS64496").unwrap();
        assert!(direct.valid);
        assert_eq!(direct.basis, DelegationBasis::Direct);
        assert!(direct.reason.contains("direct"));

        let delegated = validator.validate_delegation(&object, "AS2914").unwrap();
        assert!(delegated.valid);
        assert_eq!(delegated.basis, DelegationBasis::Delegated);

        let stranger = validator.validate_delegation(&object, "AS3356").unwrap();
        assert!(!stranger.valid);
        assert_eq!(stranger.basis, DelegationBasis::NoDelegation);
        assert!(stranger.reason.contains("no delegation"));

        assert_eq!(validator.log().count_of(DecisionKind::Delegation), 3);
    }

    #[test]
    fn test_delegation_expired() {
        let t0 = Utc::now() - Duration::days(60);
        let t1 = t0 + Duration::days(30);
        let (store, object) = delegation_fixture(t0, t1);
        let mut validator = RasaValidator::new(store.clone()).at(t1 + Duration::seconds(1));

        let outcome = validator.validate_delegation(&object, "AS2914").unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.basis, DelegationBasis::Expired);
        assert!(outcome.reason.contains("expired"));

        let mut early = RasaValidator::new(store).at(t0 - Duration::seconds(1));
        let outcome = early.validate_delegation(&object, "AS2914").unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.basis, DelegationBasis::Expired);
        assert_eq!(early.log().entries()[0].severity, Severity::Warning);
    }

    #[test]
    fn test_delegation_signer_spelling() {
        let t0 = Utc::now();
        let (store, object) = delegation_fixture(t0, t0 + Duration::days(30));
        let mut validator = RasaValidator::new(store).at(t0 + Duration::days(1));

        for signer in ["AS2914", "as2914", "2914"] {
            let outcome = validator.validate_delegation(&object, signer).unwrap();
            assert!(outcome.valid, "{signer}");
            assert_eq!(outcome.basis, DelegationBasis::Delegated, "{signer}");
        }
        for signer in ["as64496", "64496"] {
            let outcome = validator.validate_delegation(&object, signer).unwrap();
            assert_eq!(outcome.basis, DelegationBasis::Direct, "{signer}");
        }
        assert_eq!(validator.log().summary().security_events, 0);
    }

    #[test]
    fn test_delegation_scope_enforcement() {
        let t0 = Utc::now();
        let (store, _) = delegation_fixture(t0, t0 + Duration::days(30));
        let other = RasaObject::from(RasaSet::new(
            name("AS64496:AS-PEERS"),
            Asn::new(64496),
            Validity::new(t0, t0 + Duration::days(30)).unwrap(),
        ));

        let mut strict = RasaValidator::new(store.clone()).at(t0 + Duration::days(1));
        let outcome = strict.validate_delegation(&other, "AS2914").unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.basis, DelegationBasis::OutOfScope);

        let mut lenient = RasaValidator::new(store)
            .with_config(ValidatorConfig::default().with_delegation_scope(false))
            .at(t0 + Duration::days(1));
        assert!(lenient.validate_delegation(&other, "AS2914").unwrap().valid);
    }

    #[test]
    fn test_delegation_without_owner_is_invalid_object() {
        let mut validator = RasaValidator::new(MemoryStore::empty());
        let by_set: RasaObject = RasaAuth::for_set(name("AS-CHILD"), year()).into();

        let err = validator.validate_delegation(&by_set, "AS2914").unwrap_err();
        assert!(err.is_data_fault());

        let reserved: RasaObject = RasaSet::new(name("AS-ORPHAN"), Asn::RESERVED, year()).into();
        assert!(validator.validate_delegation(&reserved, "AS0").is_err());

        let entries: Vec<_> = validator.log().rejections().collect();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|entry| entry.fault.as_deref() == Some("INVALID_OBJECT")));
    }
}
