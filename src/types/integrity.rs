//! Findings produced by the read-only integrity check.

use std::fmt::{self, Write as _};

use super::collection::CollectionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingCode {
    LengthMismatch,
    MissingKey,
    DuplicateKey,
    DanglingReference,
    MissingDependent,
    PositionalDrift,
    DuplicateSlug,
    YearOutOfRange,
    EmptyFaultList,
    BlankFaultField,
    OccurrenceRateOutOfRange,
    EmptyMileageLogic,
    UnorderedMileageLogic,
}

impl FindingCode {
    #[must_use]
    pub const fn severity(self) -> FindingSeverity {
        match self {
            FindingCode::PositionalDrift
            | FindingCode::YearOutOfRange
            | FindingCode::EmptyMileageLogic
            | FindingCode::UnorderedMileageLogic => FindingSeverity::Warning,
            _ => FindingSeverity::Error,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FindingCode::LengthMismatch => "length_mismatch",
            FindingCode::MissingKey => "missing_key",
            FindingCode::DuplicateKey => "duplicate_key",
            FindingCode::DanglingReference => "dangling_reference",
            FindingCode::MissingDependent => "missing_dependent",
            FindingCode::PositionalDrift => "positional_drift",
            FindingCode::DuplicateSlug => "duplicate_slug",
            FindingCode::YearOutOfRange => "year_out_of_range",
            FindingCode::EmptyFaultList => "empty_fault_list",
            FindingCode::BlankFaultField => "blank_fault_field",
            FindingCode::OccurrenceRateOutOfRange => "occurrence_rate_out_of_range",
            FindingCode::EmptyMileageLogic => "empty_mileage_logic",
            FindingCode::UnorderedMileageLogic => "unordered_mileage_logic",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityFinding {
    pub code: FindingCode,
    pub collection: CollectionKind,
    pub model_id: Option<String>,
    pub detail: String,
}

impl IntegrityFinding {
    #[must_use]
    pub fn severity(&self) -> FindingSeverity {
        self.code.severity()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub findings: Vec<IntegrityFinding>,
    /// Length of each collection, in [`CollectionKind::ALL`] order.
    pub lengths: [usize; 4],
}

impl IntegrityReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity() == FindingSeverity::Error)
            .count()
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.findings.len() - self.error_count()
    }

    #[must_use]
    pub fn has_code(&self, code: FindingCode) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Collections: models={} market={} reliability={} faults={}",
            self.lengths[0], self.lengths[1], self.lengths[2], self.lengths[3]
        );
        for finding in &self.findings {
            let level = match finding.severity() {
                FindingSeverity::Error => "ERROR",
                FindingSeverity::Warning => "WARN ",
            };
            let id = finding.model_id.as_deref().unwrap_or("-");
            let _ = writeln!(
                out,
                "{level} [{}] {} {id}: {}",
                finding.code, finding.collection, finding.detail
            );
        }
        let _ = writeln!(
            out,
            "{} errors, {} warnings",
            self.error_count(),
            self.warning_count()
        );
        out
    }
}
