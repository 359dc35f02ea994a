//! Decision log
//!
//! Append-only, ordered record of every authorization decision taken in
//! one validation session. Entries are never deduplicated and the log is
//! never consulted while deciding; it exists to be handed to audit and
//! reporting collaborators when the session ends.

use rasa_objects::{EntityId, SetName};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decision::Decision;

/// How serious a decision is for operators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Routine outcome.
    Info,
    /// Unauthorized inclusion or a truncated expansion.
    Warning,
    /// Inclusion the subject explicitly forbids (strict mode).
    SecurityEvent,
}

impl Severity {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::SecurityEvent => "security_event",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of decision an entry records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// An ASN's consent to membership in a set.
    MemberAuth,
    /// A nested set's consent to being referenced by a parent.
    NestedSetAuth,
    /// Whether a signer may publish an object.
    Delegation,
    /// Where a set's composition was taken from.
    SourceOfTruth,
    /// A branch reached one of its own ancestors.
    CircularReference,
    /// A branch ran out of depth budget.
    MaxDepth,
    /// A nested set was included by reference only.
    DoNotInherit,
    /// A nested set is being expanded.
    ExpandNested,
}

impl DecisionKind {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::MemberAuth => "member_auth",
            DecisionKind::NestedSetAuth => "nested_set_auth",
            DecisionKind::Delegation => "delegation",
            DecisionKind::SourceOfTruth => "source_of_truth",
            DecisionKind::CircularReference => "circular_reference",
            DecisionKind::MaxDepth => "max_depth",
            DecisionKind::DoNotInherit => "do_not_inherit",
            DecisionKind::ExpandNested => "expand_nested",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionLogEntry {
    /// Position in the log, starting at 0
    pub sequence: u64,

    /// Decision kind
    pub kind: DecisionKind,

    /// ASN or set the decision is about
    pub subject: EntityId,

    /// Set the subject was being placed in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<SetName>,

    /// Outcome
    pub authorized: bool,

    /// Human-readable reason
    pub reason: String,

    /// Severity
    pub severity: Severity,

    /// Fault code when the outcome came from a validation fault
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

/// Aggregate counts over a log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogSummary {
    /// Total entries
    pub total: usize,
    /// Entries with `authorized = true`
    pub authorized: usize,
    /// Entries with `authorized = false`
    pub rejected: usize,
    /// Entries at warning severity
    pub warnings: usize,
    /// Entries at security-event severity
    pub security_events: usize,
}

/// Append-only decision log for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLog {
    session_id: Uuid,
    entries: Vec<DecisionLogEntry>,
}

impl DecisionLog {
    /// Create an empty log with a fresh session id.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::now_v7(),
            entries: Vec::new(),
        }
    }

    /// Session this log belongs to.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Append an entry and emit it as a tracing event.
    pub(crate) fn record(
        &mut self,
        kind: DecisionKind,
        subject: EntityId,
        target: Option<SetName>,
        decision: &Decision,
    ) -> &DecisionLogEntry {
        let entry = DecisionLogEntry {
            sequence: self.entries.len() as u64,
            kind,
            subject,
            target,
            authorized: decision.authorized,
            reason: decision.reason.clone(),
            severity: decision.severity,
            fault: decision.fault.map(str::to_string),
        };
        trace_entry(&self.session_id, &entry);
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// All entries in order.
    pub fn entries(&self) -> &[DecisionLogEntry] {
        &self.entries
    }

    /// Iterate over entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, DecisionLogEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of one kind, in order.
    pub fn of_kind(&self, kind: DecisionKind) -> impl Iterator<Item = &DecisionLogEntry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    /// Count entries of one kind.
    pub fn count_of(&self, kind: DecisionKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Entries recorded as security events.
    pub fn security_events(&self) -> impl Iterator<Item = &DecisionLogEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.severity == Severity::SecurityEvent)
    }

    /// Entries with a negative outcome.
    pub fn rejections(&self) -> impl Iterator<Item = &DecisionLogEntry> {
        self.entries.iter().filter(|entry| !entry.authorized)
    }

    /// Aggregate counts.
    pub fn summary(&self) -> LogSummary {
        let mut summary = LogSummary {
            total: self.entries.len(),
            ..LogSummary::default()
        };
        for entry in &self.entries {
            if entry.authorized {
                summary.authorized += 1;
            } else {
                summary.rejected += 1;
            }
            match entry.severity {
                Severity::Info => {}
                Severity::Warning => summary.warnings += 1,
                Severity::SecurityEvent => summary.security_events += 1,
            }
        }
        summary
    }

    /// Hand the entries over, ending the log.
    pub fn into_entries(self) -> Vec<DecisionLogEntry> {
        self.entries
    }
}

impl Default for DecisionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a DecisionLog {
    type Item = &'a DecisionLogEntry;
    type IntoIter = std::slice::Iter<'a, DecisionLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn trace_entry(session_id: &Uuid, entry: &DecisionLogEntry) {
    let target = entry.target.as_ref().map(SetName::as_str).unwrap_or("-");
    match entry.severity {
        Severity::Info => tracing::debug!(
            session = %session_id,
            kind = entry.kind.as_str(),
            subject = %entry.subject,
            target_set = target,
            authorized = entry.authorized,
            reason = %entry.reason,
            "RASA decision"
        ),
        Severity::Warning => tracing::warn!(
            session = %session_id,
            kind = entry.kind.as_str(),
            subject = %entry.subject,
            target_set = target,
            authorized = entry.authorized,
            reason = %entry.reason,
            "RASA decision"
        ),
        Severity::SecurityEvent => tracing::warn!(
            session = %session_id,
            security_event = true,
            kind = entry.kind.as_str(),
            subject = %entry.subject,
            target_set = target,
            authorized = entry.authorized,
            reason = %entry.reason,
            "RASA security event"
        ),
    }
}
