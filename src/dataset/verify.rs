//! Read-only cross-collection integrity check.
//!
//! Unlike the insert path, nothing here fails on bad data: every problem becomes a
//! finding so one pass reports all of them.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::constants::MILEAGE_LOGIC_FIELD;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::index::join_key;
use crate::io::CollectionStore;
use crate::types::{
    CollectionKind, FindingCode, IntegrityFinding, IntegrityReport, MileageLogic, Record,
};

const REQUIRED_FAULT_TEXT: [&str; 3] = ["component", "symptoms", "verdictImplication"];

/// Loads all four collections and checks them. Unreadable files are still errors.
pub fn verify(store: &CollectionStore) -> Result<IntegrityReport> {
    let dataset = Dataset::load(store)?;
    Ok(dataset.verify())
}

impl Dataset {
    #[must_use]
    pub fn verify(&self) -> IntegrityReport {
        let mut checker = Checker::default();
        let keys: HashMap<CollectionKind, Vec<Option<&str>>> = CollectionKind::ALL
            .into_iter()
            .map(|kind| (kind, checker.collect_keys(kind, self.records(kind))))
            .collect();

        checker.check_lengths(self.lengths());

        let definition_ids: HashSet<&str> = keys[&CollectionKind::Models]
            .iter()
            .flatten()
            .copied()
            .collect();
        for kind in CollectionKind::DEPENDENTS {
            checker.check_references(kind, &keys[&kind], &definition_ids);
        }
        if checker.findings.is_empty() {
            for kind in CollectionKind::DEPENDENTS {
                checker.check_positions(kind, &keys[&CollectionKind::Models], &keys[&kind]);
            }
        }

        let years = year_ranges(self.records(CollectionKind::Models));
        checker.check_slugs(self.records(CollectionKind::Models));
        checker.check_reliability(self.records(CollectionKind::Reliability), &years);
        checker.check_faults(self.records(CollectionKind::Faults));

        let report = IntegrityReport {
            findings: checker.findings,
            lengths: self.lengths(),
        };
        if report.is_clean() {
            tracing::info!(models = self.len(), "integrity check clean");
        } else {
            tracing::warn!(
                errors = report.error_count(),
                warnings = report.warning_count(),
                "integrity check found problems"
            );
        }
        report
    }
}

#[derive(Default)]
struct Checker {
    findings: Vec<IntegrityFinding>,
}

impl Checker {
    fn push(
        &mut self,
        code: FindingCode,
        collection: CollectionKind,
        model_id: Option<&str>,
        detail: String,
    ) {
        tracing::debug!(
            code = %code,
            collection = collection.name(),
            ?model_id,
            %detail,
            "integrity finding"
        );
        self.findings.push(IntegrityFinding {
            code,
            collection,
            model_id: model_id.map(str::to_owned),
            detail,
        });
    }

    /// Join key per position; records without one are reported and yield `None`.
    fn collect_keys<'a>(
        &mut self,
        collection: CollectionKind,
        records: &'a [Record],
    ) -> Vec<Option<&'a str>> {
        let field = collection.join_field();
        let mut seen = HashSet::new();
        records
            .iter()
            .enumerate()
            .map(|(position, record)| {
                let key = join_key(record, field);
                match key {
                    None => self.push(
                        FindingCode::MissingKey,
                        collection,
                        None,
                        format!("record #{position} has no string `{field}`"),
                    ),
                    Some(key) if !seen.insert(key) => self.push(
                        FindingCode::DuplicateKey,
                        collection,
                        Some(key),
                        format!("`{field}` repeated at record #{position}"),
                    ),
                    Some(_) => {}
                }
                key
            })
            .collect()
    }

    fn check_lengths(&mut self, lengths: [usize; 4]) {
        let models = lengths[0];
        for (kind, len) in CollectionKind::ALL.into_iter().zip(lengths).skip(1) {
            if len != models {
                self.push(
                    FindingCode::LengthMismatch,
                    kind,
                    None,
                    format!("{len} records, models has {models}"),
                );
            }
        }
    }

    fn check_references(
        &mut self,
        collection: CollectionKind,
        keys: &[Option<&str>],
        definition_ids: &HashSet<&str>,
    ) {
        let present: HashSet<&str> = keys.iter().flatten().copied().collect();
        for key in keys.iter().flatten() {
            if !definition_ids.contains(key) {
                self.push(
                    FindingCode::DanglingReference,
                    collection,
                    Some(key),
                    "no model definition with this id".into(),
                );
            }
        }
        let mut missing: Vec<&str> = definition_ids.difference(&present).copied().collect();
        missing.sort_unstable();
        for id in missing {
            self.push(
                FindingCode::MissingDependent,
                collection,
                Some(id),
                format!("model has no {collection} record"),
            );
        }
    }

    /// Key-aligned collections should also share positions; drift is a warning only.
    fn check_positions(
        &mut self,
        collection: CollectionKind,
        definitions: &[Option<&str>],
        keys: &[Option<&str>],
    ) {
        let drift = definitions
            .iter()
            .zip(keys)
            .position(|(def, key)| def != key);
        if let Some(position) = drift {
            self.push(
                FindingCode::PositionalDrift,
                collection,
                keys[position],
                format!("first out-of-order record at #{position}"),
            );
        }
    }

    fn check_slugs(&mut self, models: &[Record]) {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for record in models {
            let (Some(brand), Some(model)) = (text(record, "brand"), text(record, "model")) else {
                continue;
            };
            let id = join_key(record, "id").unwrap_or("-");
            let slug = format!("{}|{}", normalize_slug(brand), normalize_slug(model));
            if let Some(first) = seen.get(&slug) {
                self.push(
                    FindingCode::DuplicateSlug,
                    CollectionKind::Models,
                    Some(id),
                    format!("slug `{slug}` already used by `{first}`"),
                );
            } else {
                seen.insert(slug, id);
            }
        }
    }

    fn check_reliability(&mut self, records: &[Record], years: &HashMap<&str, (i64, i64)>) {
        for record in records {
            let Some(model_id) = join_key(record, "model_id") else {
                continue;
            };
            if let Some(&(start, end)) = years.get(model_id) {
                for field in ["best_years", "worst_years"] {
                    let outside: Vec<i64> = record
                        .get(field)
                        .and_then(Value::as_array)
                        .into_iter()
                        .flatten()
                        .filter_map(Value::as_i64)
                        .filter(|year| !(start..=end).contains(year))
                        .collect();
                    if !outside.is_empty() {
                        self.push(
                            FindingCode::YearOutOfRange,
                            CollectionKind::Reliability,
                            Some(model_id),
                            format!("{field} {outside:?} outside {start}..={end}"),
                        );
                    }
                }
            }
            match record.get(MILEAGE_LOGIC_FIELD) {
                Some(Value::Object(map)) if map.is_empty() => self.push(
                    FindingCode::EmptyMileageLogic,
                    CollectionKind::Reliability,
                    Some(model_id),
                    "mileage_logic_text is present but empty".into(),
                ),
                Some(value @ Value::Object(_)) => {
                    let unordered = MileageLogic::deserialize(value)
                        .is_ok_and(|logic| !logic.is_ascending());
                    if unordered {
                        self.push(
                            FindingCode::UnorderedMileageLogic,
                            CollectionKind::Reliability,
                            Some(model_id),
                            "mileage thresholds are not in ascending order".into(),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn check_faults(&mut self, records: &[Record]) {
        for record in records {
            let Some(model_id) = join_key(record, "model_id_ref") else {
                continue;
            };
            let faults = record.get("faults").and_then(Value::as_array);
            let Some(faults) = faults.filter(|list| !list.is_empty()) else {
                self.push(
                    FindingCode::EmptyFaultList,
                    CollectionKind::Faults,
                    Some(model_id),
                    "fault list is missing or empty".into(),
                );
                continue;
            };
            for (position, fault) in faults.iter().enumerate() {
                for field in REQUIRED_FAULT_TEXT {
                    let blank = fault
                        .get(field)
                        .and_then(Value::as_str)
                        .is_none_or(|value| value.trim().is_empty());
                    if blank {
                        self.push(
                            FindingCode::BlankFaultField,
                            CollectionKind::Faults,
                            Some(model_id),
                            format!("fault #{position} has blank `{field}`"),
                        );
                    }
                }
                if let Some(rate) = fault.get("occurrence_rate").and_then(Value::as_f64) {
                    if !(0.0..=1.0).contains(&rate) {
                        self.push(
                            FindingCode::OccurrenceRateOutOfRange,
                            CollectionKind::Faults,
                            Some(model_id),
                            format!("fault #{position} occurrence_rate {rate} outside 0..=1"),
                        );
                    }
                }
            }
        }
    }
}

fn text<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

/// `start_year..=end_year` per definition id.
fn year_ranges(models: &[Record]) -> HashMap<&str, (i64, i64)> {
    models
        .iter()
        .filter_map(|record| {
            let id = join_key(record, "id")?;
            let start = record.get("start_year")?.as_i64()?;
            let end = record.get("end_year")?.as_i64()?;
            Some((id, (start, end)))
        })
        .collect()
}

/// Lower-cased with everything but ASCII letters and digits removed.
fn normalize_slug(input: &str) -> String {
    input
        .chars()
        .filter_map(|c| {
            let c = c.to_ascii_lowercase();
            c.is_ascii_alphanumeric().then_some(c)
        })
        .collect()
}
