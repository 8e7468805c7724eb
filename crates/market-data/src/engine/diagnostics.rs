//! Per-source outcome tracking for one resolution.

use std::fmt;

use crate::models::SourceId;

/// Why a source was not called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No adapter for this source was registered with the engine.
    NotRegistered,

    /// The adapter does not serve the asset class being resolved.
    AssetClassNotSupported,

    /// The source's circuit is open.
    CircuitBreakerOpen,
}

/// What happened when the engine considered one source.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptOutcome {
    /// The source answered and resolved this many requested attributes.
    Resolved(usize),
    /// The source answered but every requested attribute came back null.
    Empty,
    Failed(String),
    Skipped(SkipReason),
}

#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub source_id: SourceId,
    pub outcome: AttemptOutcome,
}

impl fmt::Display for ProviderAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Resolved(count) => write!(f, "{}: RESOLVED {}", self.source_id, count),
            AttemptOutcome::Empty => write!(f, "{}: EMPTY", self.source_id),
            AttemptOutcome::Failed(err) => write!(f, "{}: ERROR ({})", self.source_id, err),
            AttemptOutcome::Skipped(reason) => {
                write!(f, "{}: SKIPPED ({:?})", self.source_id, reason)
            }
        }
    }
}

/// Ordered record of every source the engine considered.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, source_id: SourceId, outcome: AttemptOutcome) {
        self.attempts.push(ProviderAttempt { source_id, outcome });
    }

    pub fn record_skip(&mut self, source_id: SourceId, reason: SkipReason) {
        self.push(source_id, AttemptOutcome::Skipped(reason));
    }

    pub fn record_error(&mut self, source_id: SourceId, error: String) {
        self.push(source_id, AttemptOutcome::Failed(error));
    }

    pub fn record_success(&mut self, source_id: SourceId, resolved: usize) {
        let outcome = if resolved == 0 {
            AttemptOutcome::Empty
        } else {
            AttemptOutcome::Resolved(resolved)
        };
        self.push(source_id, outcome);
    }

    /// Summary for logging, in call order.
    pub fn summary(&self) -> String {
        if self.attempts.is_empty() {
            return "no sources consulted".to_string();
        }
        self.attempts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// True when some source resolved at least one attribute.
    pub fn has_success(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| matches!(a.outcome, AttemptOutcome::Resolved(_)))
    }

    /// Sources actually called, skips excluded.
    pub fn called(&self) -> Vec<SourceId> {
        self.attempts
            .iter()
            .filter(|a| !matches!(a.outcome, AttemptOutcome::Skipped(_)))
            .map(|a| a.source_id)
            .collect()
    }

    pub fn skip_reasons(&self) -> Vec<(SourceId, &SkipReason)> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.outcome {
                AttemptOutcome::Skipped(reason) => Some((a.source_id, reason)),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(SourceId, &str)> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.outcome {
                AttemptOutcome::Failed(err) => Some((a.source_id, err.as_str())),
                _ => None,
            })
            .collect()
    }
}
