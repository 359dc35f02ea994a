//! End-to-end tests for AS-SET expansion and member authorization.
//!
//! These tests build a frozen store the way a feed loader would, run
//! validation sessions against it and check both the expansion result and
//! the decision log each session leaves behind.
//!
//! Scenarios:
//! 1. Default allow and strict/non-strict rejection
//! 2. Cycles and diamonds in the nested-set graph
//! 3. doNotInherit and authoritative override
//! 4. Delegation expiry
//! 5. The AS2914:AS-GLOBAL walkthrough
//! 6. Concurrent sessions over one store

use chrono::{Duration, Utc};
use rasa_objects::{
    Asn, AuthorizedEntry, DelegationToken, EntityId, RasaAuth, RasaObject, RasaSet, SetName,
    Validity,
};
use rasa_validator::{
    DecisionKind, DelegationBasis, MemoryRegistry, MemoryStore, RasaValidator, RegistryEntry,
    Severity, ValidatorConfig, Visited,
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn name(s: &str) -> SetName {
    SetName::new(s).unwrap()
}

fn asns(values: &[u32]) -> BTreeSet<Asn> {
    values.iter().copied().map(Asn::new).collect()
}

fn year() -> Validity {
    Validity::starting_now(Duration::days(365))
}

/// Store used by the AS2914:AS-GLOBAL walkthrough.
fn global_store() -> Arc<MemoryStore> {
    MemoryStore::builder()
        .with_object(
            RasaSet::new(name("AS2914:AS-GLOBAL"), Asn::new(2914), year())
                .with_members([Asn::new(64496), Asn::new(64497), Asn::new(15169)])
                .authoritative(),
        )
        .with_object(RasaAuth::for_asn(Asn::new(15169), year()).with_entries([
            AuthorizedEntry::unrestricted(name("AS2914:AS-GLOBAL")),
            AuthorizedEntry::unrestricted(name("AS1299:AS-TWELVE99")),
        ]))
        .build()
}

// =============================================================================
// Test 1: member authorization
// =============================================================================

#[test]
fn test_asns_without_rasa_auth_are_allowed() {
    let mut validator = RasaValidator::new(global_store());

    for asn in [1, 64496, 64497, 4_200_000_000] {
        let decision = validator.check_member_auth(Asn::new(asn), &name("AS-ANYTHING"));
        assert!(decision.authorized);
        assert!(decision.reason.contains("default allow"));
    }
    assert_eq!(validator.log().len(), 4);
}

#[test]
fn test_rejection_severity() {
    let store = MemoryStore::builder()
        .with_object(
            RasaAuth::for_asn(Asn::new(64500), year())
                .with_entry(AuthorizedEntry::unrestricted(name("AS-UPSTREAM")))
                .strict(),
        )
        .with_object(
            RasaAuth::for_asn(Asn::new(64501), year())
                .with_entry(AuthorizedEntry::unrestricted(name("AS-UPSTREAM"))),
        )
        .build();
    let mut validator = RasaValidator::new(store);

    let strict = validator.check_member_auth(Asn::new(64500), &name("AS-ELSEWHERE"));
    assert!(!strict.authorized);
    assert_eq!(strict.severity, Severity::SecurityEvent);

    let lenient = validator.check_member_auth(Asn::new(64501), &name("AS-ELSEWHERE"));
    assert!(!lenient.authorized);
    assert_eq!(lenient.severity, Severity::Warning);

    let summary = validator.log().summary();
    assert_eq!(summary.rejected, 2);
    assert_eq!(summary.security_events, 1);
    assert_eq!(summary.warnings, 1);
}

// =============================================================================
// Test 2: graph shape
// =============================================================================

#[test]
fn test_cycle_is_reported_once() {
    let store = MemoryStore::builder()
        .with_object(
            RasaSet::new(name("AS-A"), Asn::new(1), year())
                .with_members([Asn::new(1)])
                .with_nested_sets([name("AS-B")]),
        )
        .with_object(
            RasaSet::new(name("AS-B"), Asn::new(2), year())
                .with_members([Asn::new(2)])
                .with_nested_sets([name("AS-A")]),
        )
        .build();
    let mut validator = RasaValidator::new(store);

    let expansion = validator.expand_with_rasa(&name("AS-A"), &[], &[], 10, &mut Visited::new());

    assert_eq!(expansion.members, asns(&[1, 2]));
    let cycles: Vec<_> = validator
        .log()
        .of_kind(DecisionKind::CircularReference)
        .collect();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].subject, EntityId::from(name("AS-A")));
    assert_eq!(cycles[0].target, Some(name("AS-B")));
    assert!(cycles[0].reason.contains("AS-A -> AS-B -> AS-A"));
    assert_eq!(validator.log().count_of(DecisionKind::MaxDepth), 0);
}

#[test]
fn test_cycle_terminates_for_any_depth() {
    let registry = MemoryRegistry::new()
        .with_entry(name("AS-A"), RegistryEntry::new([Asn::new(1)], [name("AS-B")]))
        .with_entry(name("AS-B"), RegistryEntry::new([Asn::new(2)], [name("AS-A")]))
        .freeze();

    for max_depth in 0..=32 {
        let mut validator =
            RasaValidator::new(MemoryStore::empty()).with_registry(registry.clone());

        validator.expand_with_rasa(
            &name("AS-A"),
            &[Asn::new(1)],
            &[name("AS-B")],
            max_depth,
            &mut Visited::new(),
        );

        let log = validator.log();
        assert!(log.count_of(DecisionKind::CircularReference) <= 1);
        assert!(log.len() < 16, "depth {max_depth} produced {} entries", log.len());
    }
}

#[test]
fn test_diamond_is_not_circular() {
    let registry = MemoryRegistry::new()
        .with_entry(
            name("AS-B"),
            RegistryEntry::new(Vec::<Asn>::new(), [name("AS-D")]),
        )
        .with_entry(
            name("AS-C"),
            RegistryEntry::new(Vec::<Asn>::new(), [name("AS-D")]),
        )
        .with_entry(name("AS-D"), RegistryEntry::new([Asn::new(4)], Vec::<SetName>::new()))
        .freeze();
    let mut validator = RasaValidator::new(MemoryStore::empty()).with_registry(registry);

    let expansion = validator.expand_with_rasa(
        &name("AS-A"),
        &[],
        &[name("AS-B"), name("AS-C")],
        10,
        &mut Visited::new(),
    );

    assert_eq!(expansion.members, asns(&[4]));
    assert_eq!(validator.log().count_of(DecisionKind::CircularReference), 0);

    let d_resolutions = validator
        .log()
        .of_kind(DecisionKind::SourceOfTruth)
        .filter(|entry| entry.subject == EntityId::from(name("AS-D")))
        .count();
    assert_eq!(d_resolutions, 2);
}

#[test]
fn test_depth_budget_truncates_long_chains() {
    let mut registry = MemoryRegistry::new();
    for level in 0..5u32 {
        registry.insert(
            name(&format!("AS-L{level}")),
            RegistryEntry::new([Asn::new(level + 100)], [name(&format!("AS-L{}", level + 1))]),
        );
    }
    let mut validator = RasaValidator::new(MemoryStore::empty())
        .with_registry(registry.freeze())
        .with_config(ValidatorConfig::default().with_max_depth(3));

    let expansion = validator.expand(&name("AS-L0"));

    assert_eq!(expansion.members, asns(&[100, 101, 102]));
    let truncated: Vec<_> = validator.log().of_kind(DecisionKind::MaxDepth).collect();
    assert_eq!(truncated.len(), 1);
    assert_eq!(truncated[0].subject, EntityId::from(name("AS-L3")));
    assert_eq!(truncated[0].target, Some(name("AS-L2")));
}

// =============================================================================
// Test 3: flags
// =============================================================================

#[test]
fn test_do_not_inherit_keeps_reference_only() {
    let store = MemoryStore::builder()
        .with_object(
            RasaSet::new(name("AS-G"), Asn::new(64510), year())
                .with_members([Asn::new(10), Asn::new(11)])
                .authoritative()
                .do_not_inherit(),
        )
        .with_object(
            RasaSet::new(name("AS-P"), Asn::new(64511), year())
                .with_members([Asn::new(20)])
                .with_nested_sets([name("AS-G")])
                .authoritative(),
        )
        .build();
    let mut validator = RasaValidator::new(store);

    let expansion = validator.expand_with_rasa(&name("AS-P"), &[], &[], 10, &mut Visited::new());

    assert_eq!(expansion.members, asns(&[20]));
    assert!(!expansion.contains(Asn::new(10)));
    assert!(!expansion.contains(Asn::new(11)));
    assert_eq!(expansion.opaque_references, BTreeSet::from([name("AS-G")]));
    assert_eq!(validator.log().count_of(DecisionKind::DoNotInherit), 1);
    assert_eq!(validator.log().count_of(DecisionKind::ExpandNested), 0);
}

#[test]
fn test_authoritative_set_overrides_registry() {
    let store = MemoryStore::builder()
        .with_object(
            RasaSet::new(name("AS-S"), Asn::new(64520), year())
                .with_members([Asn::new(1)])
                .authoritative(),
        )
        .build();
    let mut validator = RasaValidator::new(store);

    let expansion = validator.expand_with_rasa(
        &name("AS-S"),
        &[Asn::new(2)],
        &[name("AS-REGISTRY-ONLY")],
        10,
        &mut Visited::new(),
    );

    assert_eq!(expansion.members, asns(&[1]));
    assert!(!expansion.contains(Asn::new(2)));
    assert_eq!(expansion.expanded_sets, BTreeSet::from([name("AS-S")]));
    let source = validator
        .log()
        .of_kind(DecisionKind::SourceOfTruth)
        .next()
        .unwrap();
    assert!(source.reason.contains("authoritative"));
}

// =============================================================================
// Test 4: delegation
// =============================================================================

#[test]
fn test_delegation_expires_after_window() {
    let t0 = Utc::now() - Duration::days(10);
    let t1 = t0 + Duration::days(5);
    let customers = name("AS64496:AS-CUSTOMERS");
    let store = MemoryStore::builder()
        .with_delegation(DelegationToken::new(
            Asn::new(64496),
            "AS2914",
            vec![customers.clone()],
            Validity::new(t0, t1).unwrap(),
        ))
        .build();
    let object: RasaObject = RasaSet::new(customers, Asn::new(64496), year()).into();

    let mut inside = RasaValidator::new(store.clone()).at(t0 + Duration::days(1));
    assert_eq!(
        inside.validate_delegation(&object, "AS2914").unwrap().basis,
        DelegationBasis::Delegated
    );

    for config in [
        ValidatorConfig::default(),
        ValidatorConfig::default().with_delegation_scope(false),
    ] {
        let mut after = RasaValidator::new(store.clone())
            .with_config(config)
            .at(t1 + Duration::seconds(1));
        let outcome = after.validate_delegation(&object, "AS2914").unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.basis, DelegationBasis::Expired);
        assert_eq!(after.log().count_of(DecisionKind::Delegation), 1);
    }
}

// =============================================================================
// Test 5: AS2914:AS-GLOBAL walkthrough
// =============================================================================

#[test]
fn test_global_set_expansion() {
    let mut validator = RasaValidator::new(global_store());

    let expansion = validator.expand_with_rasa(
        &name("AS2914:AS-GLOBAL"),
        &[],
        &[],
        10,
        &mut Visited::new(),
    );

    assert_eq!(expansion.members, asns(&[64496, 64497, 15169]));
    assert!(expansion.opaque_references.is_empty());

    let log = validator.log();
    assert_eq!(log.count_of(DecisionKind::SourceOfTruth), 1);
    assert_eq!(log.count_of(DecisionKind::MemberAuth), 3);
    assert_eq!(log.rejections().count(), 0);
}

#[test]
fn test_unlisted_parent_is_rejected_with_warning() {
    let mut validator = RasaValidator::new(global_store());

    let decision = validator.check_member_auth(Asn::new(15169), &name("AS-EVIL:CUSTOMERS"));

    assert!(!decision.authorized);
    assert_eq!(decision.severity, Severity::Warning);
    assert!(decision.reason.contains("not in authorizedIn"));

    let entry = &validator.log().entries()[0];
    assert_eq!(entry.reason, decision.reason);
    assert_eq!(entry.target, Some(name("AS-EVIL:CUSTOMERS")));
}

#[test]
fn test_hijacking_set_loses_consenting_members_only() {
    let registry = MemoryRegistry::new()
        .with_entry(
            name("AS-EVIL:CUSTOMERS"),
            RegistryEntry::new([Asn::new(15169), Asn::new(64666)], Vec::<SetName>::new()),
        )
        .freeze();
    let mut validator = RasaValidator::new(global_store()).with_registry(registry);

    let expansion = validator.expand(&name("AS-EVIL:CUSTOMERS"));

    assert_eq!(expansion.members, asns(&[64666]));
    assert_eq!(validator.log().rejections().count(), 1);
}

// =============================================================================
// Test 6: concurrent sessions
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_share_store() {
    let store = global_store();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::task::spawn_blocking(move || {
                let mut validator = RasaValidator::new(store);
                let expansion = validator.expand_with_rasa(
                    &name("AS2914:AS-GLOBAL"),
                    &[],
                    &[],
                    10,
                    &mut Visited::new(),
                );
                validator.check_member_auth(Asn::new(15169), &name("AS-EVIL:CUSTOMERS"));
                (expansion, validator.into_log())
            })
        })
        .collect();

    let mut sessions = BTreeSet::new();
    for handle in handles {
        let (expansion, log) = handle.await.unwrap();
        assert_eq!(expansion.members, asns(&[64496, 64497, 15169]));
        assert_eq!(log.len(), 5);
        assert_eq!(log.rejections().count(), 1);
        sessions.insert(log.session_id());
    }
    assert_eq!(sessions.len(), 8);
}
