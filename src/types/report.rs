//! Run reports for the inject and backfill passes.

use std::fmt::Write as _;

use crate::error::CandidateRejection;

/// What happened to one candidate model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Added,
    /// Already present in the definitions; re-running a batch lands here.
    SkippedDuplicate,
    SkippedInvalid(CandidateRejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutcome {
    pub model_id: String,
    /// `BRAND Model` taken from the candidate definition.
    pub label: String,
    pub status: OutcomeStatus,
}

impl ModelOutcome {
    fn line(&self) -> String {
        match &self.status {
            OutcomeStatus::Added => format!(" + Added: {} ({})", self.label, self.model_id),
            OutcomeStatus::SkippedDuplicate => {
                format!(" ! Skipping {} (already exists)", self.model_id)
            }
            OutcomeStatus::SkippedInvalid(reason) => {
                format!(" x Rejected {}: {reason}", self.model_id)
            }
        }
    }
}

/// Summary of one synchronized insert run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectReport {
    pub outcomes: Vec<ModelOutcome>,
    /// Length shared by all four collections after the run.
    pub total_models: usize,
    /// Whether any collection file was rewritten.
    pub persisted: bool,
    pub dry_run: bool,
}

impl InjectReport {
    #[must_use]
    pub fn added(&self) -> usize {
        self.count(|status| matches!(status, OutcomeStatus::Added))
    }

    #[must_use]
    pub fn skipped_duplicate(&self) -> usize {
        self.count(|status| matches!(status, OutcomeStatus::SkippedDuplicate))
    }

    #[must_use]
    pub fn skipped_invalid(&self) -> usize {
        self.count(|status| matches!(status, OutcomeStatus::SkippedInvalid(_)))
    }

    /// Candidates rejected for disagreeing join keys.
    pub fn key_consistency_errors(&self) -> impl Iterator<Item = &ModelOutcome> {
        self.outcomes.iter().filter(|outcome| {
            matches!(
                outcome.status,
                OutcomeStatus::SkippedInvalid(CandidateRejection::KeyConsistency { .. })
            )
        })
    }

    fn count(&self, pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            let _ = writeln!(out, "{}", outcome.line());
        }
        let _ = writeln!(
            out,
            "Added {}, skipped {} duplicate, rejected {} invalid.",
            self.added(),
            self.skipped_duplicate(),
            self.skipped_invalid()
        );
        let _ = writeln!(out, "Total entries now: {}", self.total_models);
        if self.dry_run {
            out.push_str("Dry run: no files written.\n");
        } else if self.persisted {
            let _ = writeln!(
                out,
                "Injected {} new models into all 4 collections.",
                self.added()
            );
        } else {
            out.push_str("No new models added.\n");
        }
        out
    }
}

/// Summary of one mileage-advice backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Model ids whose `mileage_logic_text` was filled, in collection order.
    pub updated: Vec<String>,
    pub already_populated: usize,
    /// Records missing the field with no lookup entry.
    pub unmatched: usize,
    pub persisted: bool,
    pub dry_run: bool,
}

impl BackfillReport {
    #[must_use]
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for model_id in &self.updated {
            let _ = writeln!(out, "[OK] Added mileage_logic_text to: {model_id}");
        }
        let _ = writeln!(
            out,
            "[DONE] Updated {} models with mileage_logic_text ({} already populated, {} without lookup entry)",
            self.updated.len(),
            self.already_populated,
            self.unmatched
        );
        if self.dry_run {
            out.push_str("Dry run: no files written.\n");
        } else if !self.persisted {
            out.push_str("Nothing changed; reliability collection left untouched.\n");
        }
        out
    }
}
