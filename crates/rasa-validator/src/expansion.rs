//! AS-SET expansion
//!
//! Depth-first walk of a set and its nested sets. Each visited set has its
//! composition resolved against the RASA-SET store and the legacy
//! registry, its members filtered by consent, and its nested sets either
//! recursed into or kept as opaque references.
//!
//! Cycle detection is per path: a set is visited while it is an ancestor
//! of the current branch, so a set reachable along two different branches
//! (a diamond) is expanded once per branch and never reported as circular.
//!
//! The work done, and the number of log entries written, therefore grows
//! with the number of distinct paths rather than the number of sets.
//! Stacked diamonds multiply: `k` layers of `w` fully cross-linked sets
//! give up to `w^k` paths to the bottom layer, bounded by
//! [`ValidatorConfig::max_depth`](crate::ValidatorConfig::max_depth). Pick
//! the depth budget with that in mind when expanding untrusted graphs.

use rasa_objects::{Asn, SetName};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;

use crate::decision::Decision;
use crate::error::RasaError;
use crate::log::{DecisionKind, Severity};
use crate::store::AuthorizationStore;
use crate::validator::RasaValidator;

/// Result of expanding one set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Expansion {
    /// Authorized member ASNs, flattened across all expanded branches
    pub members: BTreeSet<Asn>,

    /// Nested sets marked `doNotInherit`, included by name only
    pub opaque_references: BTreeSet<SetName>,

    /// Sets whose composition was resolved during the walk
    pub expanded_sets: BTreeSet<SetName>,
}

impl Expansion {
    /// Check whether `asn` ended up in the flattened membership.
    pub fn contains(&self, asn: Asn) -> bool {
        self.members.contains(&asn)
    }

    /// Check if nothing was produced.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.opaque_references.is_empty()
    }

    fn absorb(&mut self, other: Expansion) {
        self.members.extend(other.members);
        self.opaque_references.extend(other.opaque_references);
        self.expanded_sets.extend(other.expanded_sets);
    }
}

/// Ancestor chain of the set currently being expanded.
///
/// Entered before a set's nested sets are walked and left once they are
/// done, so sibling branches never see each other's sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visited {
    path: Vec<SetName>,
}

impl Visited {
    /// Start with no ancestors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start below an existing chain of ancestors, outermost first.
    pub fn from_path<I>(ancestors: I) -> Self
    where
        I: IntoIterator<Item = SetName>,
    {
        Self {
            path: ancestors.into_iter().collect(),
        }
    }

    /// Whether `set` is an ancestor on the current branch.
    pub fn contains(&self, set: &SetName) -> bool {
        self.path.contains(set)
    }

    /// Current ancestor chain, outermost first.
    pub fn path(&self) -> &[SetName] {
        &self.path
    }

    /// Number of ancestors.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    fn parent(&self) -> Option<&SetName> {
        self.path.last()
    }

    pub(crate) fn enter(&mut self, set: SetName) {
        self.path.push(set);
    }

    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    fn cycle_path(&self, repeat: &SetName) -> String {
        let start = self
            .path
            .iter()
            .position(|set| set == repeat)
            .unwrap_or(0);
        self.path[start..]
            .iter()
            .chain(std::iter::once(repeat))
            .map(SetName::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl RasaValidator {
    /// Expand `set` using the configured registry and depth budget.
    #[instrument(level = "debug", skip(self), fields(session = %self.log.session_id()))]
    pub fn expand(&mut self, set: &SetName) -> Expansion {
        let advisory = self.registry.lookup(set).unwrap_or_default();
        let members: Vec<Asn> = advisory.members.into_iter().collect();
        let nested: Vec<SetName> = advisory.nested_sets.into_iter().collect();
        let max_depth = self.config.max_depth;

        self.expand_with_rasa(set, &members, &nested, max_depth, &mut Visited::new())
    }

    /// Expand `set` given its advisory registry composition.
    ///
    /// `max_depth` is the remaining budget: a set reached with a budget of
    /// zero is logged as `max_depth` and contributes nothing. Nested sets
    /// take their advisory data from the configured registry.
    #[instrument(level = "trace", skip_all, fields(set = %set, max_depth = max_depth))]
    pub fn expand_with_rasa(
        &mut self,
        set: &SetName,
        advisory_members: &[Asn],
        advisory_nested: &[SetName],
        max_depth: u32,
        visited: &mut Visited,
    ) -> Expansion {
        let parent = visited.parent().cloned();

        if visited.contains(set) {
            let fault = RasaError::CycleDetected {
                set: set.clone(),
                path: visited.cycle_path(set),
            };
            self.log.record(
                DecisionKind::CircularReference,
                set.clone().into(),
                parent,
                &Decision::from_fault(&fault, "branch skipped", Severity::Warning),
            );
            return Expansion::default();
        }

        if max_depth == 0 {
            let fault = RasaError::DepthExceeded { set: set.clone() };
            self.log.record(
                DecisionKind::MaxDepth,
                set.clone().into(),
                parent,
                &Decision::from_fault(&fault, "branch truncated", Severity::Warning),
            );
            return Expansion::default();
        }

        visited.enter(set.clone());
        let expansion =
            self.expand_entered(set, advisory_members, advisory_nested, max_depth, visited);
        visited.leave();
        expansion
    }

    fn expand_entered(
        &mut self,
        set: &SetName,
        advisory_members: &[Asn],
        advisory_nested: &[SetName],
        max_depth: u32,
        visited: &mut Visited,
    ) -> Expansion {
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);

        let (members, nested_sets) =
            self.resolve_source_of_truth(store.as_ref(), set, advisory_members, advisory_nested);

        let mut expansion = Expansion {
            members: self.filter_members(set, members).authorized,
            expanded_sets: BTreeSet::from([set.clone()]),
            ..Expansion::default()
        };

        for nested in nested_sets {
            if !self.check_asset_set_auth(&nested, set).authorized {
                continue;
            }

            let opaque = store
                .lookup_set(&nested)
                .map_or(false, |rasa_set| rasa_set.flags.do_not_inherit);
            if opaque {
                self.log.record(
                    DecisionKind::DoNotInherit,
                    nested.clone().into(),
                    Some(set.clone()),
                    &Decision::allow("doNotInherit set, including reference only"),
                );
                expansion.opaque_references.insert(nested);
                continue;
            }

            self.log.record(
                DecisionKind::ExpandNested,
                nested.clone().into(),
                Some(set.clone()),
                &Decision::allow("Expanding nested set"),
            );
            let advisory = registry.lookup(&nested).unwrap_or_default();
            let child_members: Vec<Asn> = advisory.members.into_iter().collect();
            let child_nested: Vec<SetName> = advisory.nested_sets.into_iter().collect();
            let child = self.expand_with_rasa(
                &nested,
                &child_members,
                &child_nested,
                max_depth - 1,
                visited,
            );
            expansion.absorb(child);
        }

        expansion
    }

    fn resolve_source_of_truth(
        &mut self,
        store: &dyn AuthorizationStore,
        set: &SetName,
        advisory_members: &[Asn],
        advisory_nested: &[SetName],
    ) -> (BTreeSet<Asn>, BTreeSet<SetName>) {
        let (reason, members, nested) = match store.lookup_set(set) {
            Some(rasa_set) if rasa_set.flags.authoritative => (
                "Using authoritative RASA-SET, ignoring registry data",
                rasa_set.members.clone(),
                rasa_set.nested_sets.clone(),
            ),
            Some(rasa_set) => (
                "Merging RASA-SET with registry data",
                rasa_set
                    .members
                    .iter()
                    .chain(advisory_members)
                    .copied()
                    .collect(),
                rasa_set
                    .nested_sets
                    .iter()
                    .chain(advisory_nested)
                    .cloned()
                    .collect(),
            ),
            None => (
                "No RASA-SET found, using registry data",
                advisory_members.iter().copied().collect(),
                advisory_nested.iter().cloned().collect(),
            ),
        };

        self.log.record(
            DecisionKind::SourceOfTruth,
            set.clone().into(),
            None,
            &Decision::allow(reason),
        );
        (members, nested)
    }
}
