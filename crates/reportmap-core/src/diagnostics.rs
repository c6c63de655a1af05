//! Non-fatal data-quality findings collected during a run.
//!
//! Every stage appends to one [`Diagnostics`] value instead of failing. Each
//! recorded issue is also emitted through `tracing` so that `-v` shows them as
//! they happen.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Which input collection an issue or statistic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Bookmark definitions.
    Bookmarks,
    /// Page definitions.
    Pages,
    /// Captured visuals.
    Visuals,
}

impl SourceKind {
    /// All sources in pipeline order.
    pub const ALL: [Self; 3] = [Self::Bookmarks, Self::Pages, Self::Visuals];

    /// Lower-case name used in logs and the Diagnostics sheet.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bookmarks => "bookmarks",
            Self::Pages => "pages",
            Self::Visuals => "visuals",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Expected in real data (an unmatched reference).
    Info,
    /// Data was dropped or altered.
    Warning,
    /// A whole source was lost.
    Error,
}

impl Severity {
    /// Label used in exported sheets.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Kind of data-quality issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// An entry lacked a required identifier or could not be read; dropped.
    MalformedRecord,
    /// An identifier collided within one collection; the first record was kept.
    DuplicateIdentifier,
    /// A cross-collection lookup found no match.
    UnresolvedReference,
    /// An unrecognised enum value was coerced to `Unknown`.
    CoercedValue,
    /// A whole collection could not be obtained.
    SourceUnavailable,
}

impl IssueKind {
    /// Severity implied by the kind.
    pub const fn severity(self) -> Severity {
        match self {
            Self::UnresolvedReference => Severity::Info,
            Self::MalformedRecord | Self::DuplicateIdentifier | Self::CoercedValue => {
                Severity::Warning
            },
            Self::SourceUnavailable => Severity::Error,
        }
    }

    /// Label used in exported sheets.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedRecord => "malformed_record",
            Self::DuplicateIdentifier => "duplicate_identifier",
            Self::UnresolvedReference => "unresolved_reference",
            Self::CoercedValue => "coerced_value",
            Self::SourceUnavailable => "source_unavailable",
        }
    }
}

/// One recorded finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// What went wrong.
    pub kind: IssueKind,
    /// How serious it is.
    pub severity: Severity,
    /// Collection the offending record came from.
    pub source: SourceKind,
    /// Identifier of the offending record, when it had one.
    pub identifier: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

/// Per-source counters kept by the normalizer and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizeStats {
    /// Raw entries handed to the normalizer.
    pub received: usize,
    /// Canonical records produced.
    pub kept: usize,
    /// Entries dropped as malformed.
    pub dropped: usize,
    /// Enum values coerced to `Unknown`.
    pub coerced: usize,
    /// Byte-identical capture repeats collapsed into one.
    pub collapsed_duplicates: usize,
    /// Records removed by the index for a colliding identifier.
    pub duplicates: usize,
}

/// One value per source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerSource<T> {
    /// Bookmarks entry.
    pub bookmarks: T,
    /// Pages entry.
    pub pages: T,
    /// Visuals entry.
    pub visuals: T,
}

impl<T> PerSource<T> {
    /// Borrow the entry for `kind`.
    pub const fn get(&self, kind: SourceKind) -> &T {
        match kind {
            SourceKind::Bookmarks => &self.bookmarks,
            SourceKind::Pages => &self.pages,
            SourceKind::Visuals => &self.visuals,
        }
    }

    /// Mutably borrow the entry for `kind`.
    pub const fn get_mut(&mut self, kind: SourceKind) -> &mut T {
        match kind {
            SourceKind::Bookmarks => &mut self.bookmarks,
            SourceKind::Pages => &mut self.pages,
            SourceKind::Visuals => &mut self.visuals,
        }
    }
}

/// Aggregate view of a run's diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSummary {
    /// Number of issues recorded.
    pub total_issues: usize,
    /// Issues at warning severity or above.
    pub warnings: usize,
    /// Issue counts keyed by kind label.
    pub by_kind: BTreeMap<String, usize>,
    /// Sources that could not be loaded.
    pub unavailable_sources: Vec<SourceKind>,
    /// Normalizer and index counters per source.
    pub stats: PerSource<NormalizeStats>,
}

/// Issue log and counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    issues: Vec<Issue>,
    stats: PerSource<NormalizeStats>,
}

impl Diagnostics {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an issue and emit it through `tracing`.
    pub fn record(
        &mut self,
        kind: IssueKind,
        source: SourceKind,
        identifier: Option<&str>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        let severity = kind.severity();
        let id = identifier.unwrap_or("-");
        if severity >= Severity::Warning {
            warn!(kind = kind.as_str(), source = source.as_str(), id, "{message}");
        } else {
            debug!(kind = kind.as_str(), source = source.as_str(), id, "{message}");
        }
        self.issues.push(Issue {
            kind,
            severity,
            source,
            identifier: identifier.map(str::to_string),
            message,
        });
    }

    /// Record an entry dropped for lacking a required field.
    pub fn malformed(&mut self, source: SourceKind, identifier: Option<&str>, message: impl Into<String>) {
        self.stats.get_mut(source).dropped += 1;
        self.record(IssueKind::MalformedRecord, source, identifier, message);
    }

    /// Record a record removed for a colliding identifier.
    pub fn duplicate(&mut self, source: SourceKind, identifier: &str, message: impl Into<String>) {
        self.stats.get_mut(source).duplicates += 1;
        self.record(IssueKind::DuplicateIdentifier, source, Some(identifier), message);
    }

    /// Record a lookup that matched nothing.
    pub fn unresolved(&mut self, source: SourceKind, identifier: &str, message: impl Into<String>) {
        self.record(IssueKind::UnresolvedReference, source, Some(identifier), message);
    }

    /// Record an enum value coerced to `Unknown`.
    pub fn coerced(&mut self, source: SourceKind, identifier: &str, message: impl Into<String>) {
        self.stats.get_mut(source).coerced += 1;
        self.record(IssueKind::CoercedValue, source, Some(identifier), message);
    }

    /// Record a source that could not be loaded at all.
    pub fn source_unavailable(&mut self, source: SourceKind, reason: impl Into<String>) {
        self.record(IssueKind::SourceUnavailable, source, None, reason);
    }

    /// Counters for `source`.
    pub const fn stats(&self, source: SourceKind) -> &NormalizeStats {
        self.stats.get(source)
    }

    /// Mutable counters for `source`.
    pub const fn stats_mut(&mut self, source: SourceKind) -> &mut NormalizeStats {
        self.stats.get_mut(source)
    }

    /// Issues in the order they were recorded.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Issues of one kind.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    /// Number of issues at warning severity or above.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity >= Severity::Warning)
            .count()
    }

    /// `true` when any warning or error was recorded.
    pub fn has_warnings(&self) -> bool {
        self.warning_count() > 0
    }

    /// Whether `source` was reported unavailable.
    pub fn is_unavailable(&self, source: SourceKind) -> bool {
        self.issues_of(IssueKind::SourceUnavailable)
            .any(|issue| issue.source == source)
    }

    /// Aggregate counts.
    pub fn summary(&self) -> DiagnosticSummary {
        let mut by_kind = BTreeMap::new();
        for issue in &self.issues {
            *by_kind.entry(issue.kind.as_str().to_string()).or_insert(0) += 1;
        }
        DiagnosticSummary {
            total_issues: self.issues.len(),
            warnings: self.warning_count(),
            by_kind,
            unavailable_sources: SourceKind::ALL
                .into_iter()
                .filter(|source| self.is_unavailable(*source))
                .collect(),
            stats: self.stats.clone(),
        }
    }
}
