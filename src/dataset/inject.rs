//! Synchronized insert of candidate models into all four collections.

use tracing::instrument;

use crate::catalog::{Candidate, CandidateCatalog, CatalogEntry, UnreadableCandidate};
use crate::dataset::Dataset;
use crate::error::{CandidateRejection, Result};
use crate::index::IdentityIndex;
use crate::io::{CollectionPaths, CollectionStore};
use crate::types::{CollectionKind, InjectReport, ModelOutcome, OutcomeStatus};

#[derive(Debug, Clone, Copy, Default)]
pub struct InjectOptions {
    /// Compute outcomes without writing any file.
    pub dry_run: bool,
}

/// Load-all, insert, save-all driver bound to one store.
#[derive(Debug)]
pub struct SynchronizedInserter<'a> {
    store: &'a CollectionStore,
    options: InjectOptions,
}

impl<'a> SynchronizedInserter<'a> {
    #[must_use]
    pub fn new(store: &'a CollectionStore) -> Self {
        Self::with_options(store, InjectOptions::default())
    }

    #[must_use]
    pub fn with_options(store: &'a CollectionStore, options: InjectOptions) -> Self {
        Self { store, options }
    }

    /// Inserts every new, valid candidate and persists the result.
    ///
    /// Files are rewritten only when at least one model was added.
    #[instrument(skip_all, fields(candidates = catalog.len(), dry_run = self.options.dry_run))]
    pub fn run(&self, catalog: &CandidateCatalog) -> Result<InjectReport> {
        let mut dataset = Dataset::load(self.store)?;
        tracing::debug!(models = dataset.len(), "dataset loaded");

        let outcomes = dataset.apply_candidates(catalog)?;
        let mut report = InjectReport {
            outcomes,
            total_models: dataset.len(),
            persisted: false,
            dry_run: self.options.dry_run,
        };

        if report.added() > 0 && !self.options.dry_run {
            dataset.save(self.store)?;
            report.persisted = true;
        }

        tracing::info!(
            added = report.added(),
            skipped_duplicate = report.skipped_duplicate(),
            skipped_invalid = report.skipped_invalid(),
            total = report.total_models,
            persisted = report.persisted,
            "inject finished"
        );
        Ok(report)
    }
}

/// Runs one inject batch against the collections at `paths`.
pub fn run(paths: &CollectionPaths, catalog: &CandidateCatalog) -> Result<InjectReport> {
    let store = CollectionStore::new(paths.clone());
    SynchronizedInserter::new(&store).run(catalog)
}

/// Join-key indexes of all four collections, kept in step with appends.
struct KeyIndexes {
    models: IdentityIndex,
    dependents: [(CollectionKind, IdentityIndex); 3],
}

impl KeyIndexes {
    fn build(dataset: &Dataset) -> Result<Self> {
        let [market, reliability, faults] = CollectionKind::DEPENDENTS;
        Ok(Self {
            models: dataset.index(CollectionKind::Models)?,
            dependents: [
                (market, dataset.index(market)?),
                (reliability, dataset.index(reliability)?),
                (faults, dataset.index(faults)?),
            ],
        })
    }

    /// Dependent collections already holding `key` without a matching definition.
    fn orphan_holders(&self, key: &str) -> Vec<CollectionKind> {
        self.dependents
            .iter()
            .filter(|(_, index)| index.contains(key))
            .map(|(kind, _)| *kind)
            .collect()
    }

    fn insert(&mut self, key: &str) {
        self.models.insert(key);
        for (_, index) in &mut self.dependents {
            index.insert(key);
        }
    }
}

impl Dataset {
    /// Appends each new, valid candidate to all four collections, in catalog order.
    ///
    /// A candidate whose id is already defined is skipped. One that failed to parse or
    /// validate, or whose key already sits in a dependent collection, is rejected.
    /// Neither case touches any collection. Structural problems with the loaded data are returned as errors
    /// before anything is appended.
    pub fn apply_candidates(&mut self, catalog: &CandidateCatalog) -> Result<Vec<ModelOutcome>> {
        self.ensure_co_indexed()?;
        let mut indexes = KeyIndexes::build(self)?;
        let mut outcomes = Vec::with_capacity(catalog.len());

        for entry in catalog {
            let outcome = match entry {
                CatalogEntry::Candidate(candidate) => ModelOutcome {
                    model_id: candidate.model_id().to_owned(),
                    label: candidate.label(),
                    status: self.apply_candidate(candidate, &mut indexes)?,
                },
                CatalogEntry::Unreadable(unreadable) => reject_unreadable(unreadable, &indexes),
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn apply_candidate(
        &mut self,
        candidate: &Candidate,
        indexes: &mut KeyIndexes,
    ) -> Result<OutcomeStatus> {
        let model_id = candidate.model_id();

        if indexes.models.contains(model_id) {
            tracing::info!(model_id, "skipping model: already exists");
            return Ok(OutcomeStatus::SkippedDuplicate);
        }

        let rejection = match candidate.validate() {
            Err(rejection) => Some(rejection),
            Ok(()) => {
                let holders = indexes.orphan_holders(model_id);
                (!holders.is_empty()).then_some(CandidateRejection::KeyConflict {
                    collections: holders,
                })
            }
        };
        if let Some(rejection) = rejection {
            tracing::warn!(model_id, reason = %rejection, "rejecting candidate");
            return Ok(OutcomeStatus::SkippedInvalid(rejection));
        }

        let unknown = candidate.unknown_fields();
        if !unknown.is_empty() {
            tracing::warn!(model_id, fields = ?unknown, "storing fields with no known meaning");
        }

        let records = candidate.to_records()?;
        for (kind, record) in CollectionKind::ALL.into_iter().zip(records) {
            self.records_mut(kind).push(record);
        }
        indexes.insert(model_id);

        tracing::info!(model_id, label = %candidate.label(), "added model");
        Ok(OutcomeStatus::Added)
    }
}

/// An entry that never parsed still counts as a duplicate when its id is already defined.
fn reject_unreadable(unreadable: &UnreadableCandidate, indexes: &KeyIndexes) -> ModelOutcome {
    let status = if indexes.models.contains(&unreadable.model_id) {
        tracing::info!(model_id = %unreadable.model_id, "skipping model: already exists");
        OutcomeStatus::SkippedDuplicate
    } else {
        tracing::warn!(
            model_id = %unreadable.model_id,
            position = unreadable.position,
            reason = %unreadable.rejection,
            "rejecting unreadable candidate"
        );
        OutcomeStatus::SkippedInvalid(unreadable.rejection.clone())
    };
    ModelOutcome {
        model_id: unreadable.model_id.clone(),
        label: unreadable.label.clone(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatasetError;
    use crate::types::{
        FaultEntry, FaultRecord, MarketRecord, ModelDefinition, Record, ReliabilityRecord,
    };
    use serde_json::{Number, Value, json};

    fn candidate(id: &str) -> Candidate {
        Candidate {
            model_def: ModelDefinition {
                id: id.into(),
                brand: "BRAND".into(),
                model: id.to_uppercase(),
                generation: "Gen 1".into(),
                start_year: 2015,
                end_year: 2020,
                extra: Record::new(),
            },
            market: MarketRecord {
                model_id: id.into(),
                price_snapshot: Number::from(12_000),
                depreciation_rate: 0.12,
                avg_annual_repair_cost: Number::from(800),
                depreciation_outlook: "Moderate".into(),
                common_junk_value: None,
                extra: Record::new(),
            },
            reliability: ReliabilityRecord {
                model_id: id.into(),
                score: 60,
                lifespan_miles: 200_000,
                best_years: vec![2019],
                worst_years: vec![2015],
                common_trouble_spots: vec!["Water Pump".into()],
                critical_milestones: Vec::new(),
                mileage_logic_text: None,
                extra: Record::new(),
            },
            faults: FaultRecord {
                model_id_ref: id.into(),
                faults: vec![FaultEntry {
                    component: "Water Pump".into(),
                    symptoms: "Coolant loss".into(),
                    repair_cost: Number::from(900),
                    verdict_implication: "Moderate".into(),
                    occurrence_rate: None,
                    avg_failure_mileage: None,
                    extra: Record::new(),
                }],
                extra: Record::new(),
            },
        }
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn same_id_twice_in_one_batch_is_added_once() {
        let mut dataset = Dataset::default();
        let catalog = CandidateCatalog::new(vec![candidate("model_a"), candidate("model_a")]);

        let outcomes = dataset.apply_candidates(&catalog).expect("apply");
        assert_eq!(outcomes[0].status, OutcomeStatus::Added);
        assert_eq!(outcomes[1].status, OutcomeStatus::SkippedDuplicate);
        assert_eq!(dataset.lengths(), [1, 1, 1, 1]);
    }

    #[test]
    fn orphaned_dependent_key_blocks_insert() {
        let mut dataset = Dataset::new(
            Vec::new(),
            vec![record(json!({"model_id": "model_a"}))],
            Vec::new(),
            Vec::new(),
        );
        // Lengths differ, so co-indexing fails first.
        let err = dataset
            .apply_candidates(&CandidateCatalog::new(vec![candidate("model_a")]))
            .expect_err("misaligned");
        assert!(matches!(err, DatasetError::Misaligned { .. }));

        let mut dataset = Dataset::new(
            vec![record(json!({"id": "model_b"}))],
            vec![record(json!({"model_id": "model_a"}))],
            vec![record(json!({"model_id": "model_b"}))],
            vec![record(json!({"model_id_ref": "model_b", "faults": []}))],
        );
        let outcomes = dataset
            .apply_candidates(&CandidateCatalog::new(vec![candidate("model_a")]))
            .expect("apply");
        match &outcomes[0].status {
            OutcomeStatus::SkippedInvalid(CandidateRejection::KeyConflict { collections }) => {
                assert_eq!(collections, &[CollectionKind::Market]);
            }
            other => panic!("unexpected status: {other:?}"),
        }
        assert_eq!(dataset.lengths(), [1, 1, 1, 1]);
    }

    #[test]
    fn appended_records_share_position_and_key() {
        let mut dataset = Dataset::default();
        let catalog = CandidateCatalog::new(vec![candidate("model_a"), candidate("model_b")]);
        dataset.apply_candidates(&catalog).expect("apply");

        for position in 0..2 {
            let id = dataset.records(CollectionKind::Models)[position]["id"].clone();
            for kind in CollectionKind::DEPENDENTS {
                assert_eq!(
                    dataset.records(kind)[position][kind.join_field()],
                    id,
                    "{kind} out of step at #{position}"
                );
            }
        }
    }

    #[test]
    fn corrupt_existing_data_aborts_before_mutation() {
        let mut dataset = Dataset::new(
            vec![record(json!({"brand": "NO ID"}))],
            vec![record(json!({"model_id": "x"}))],
            vec![record(json!({"model_id": "x"}))],
            vec![record(json!({"model_id_ref": "x", "faults": []}))],
        );
        let before = dataset.clone();
        let err = dataset
            .apply_candidates(&CandidateCatalog::new(vec![candidate("model_a")]))
            .expect_err("definition without id");
        assert!(matches!(err, DatasetError::MissingKey { .. }));
        assert_eq!(dataset, before);
    }

    #[test]
    fn unreadable_entry_is_rejected_alone() {
        let mut dataset = Dataset::default();
        let mut broken = serde_json::to_value(candidate("model_b")).expect("to value");
        broken["reliability"]
            .as_object_mut()
            .expect("reliability object")
            .remove("score");
        let entries = vec![
            serde_json::to_value(candidate("model_a")).expect("to value"),
            broken,
        ];
        let raw = serde_json::to_vec(&entries).expect("encode");
        let catalog = CandidateCatalog::from_slice("batch.json", &raw).expect("catalog");

        let outcomes = dataset.apply_candidates(&catalog).expect("apply");
        assert_eq!(outcomes[0].status, OutcomeStatus::Added);
        assert_eq!(outcomes[1].model_id, "model_b");
        assert!(matches!(
            outcomes[1].status,
            OutcomeStatus::SkippedInvalid(CandidateRejection::Schema { .. })
        ));
        assert_eq!(dataset.lengths(), [1, 1, 1, 1]);

        // Once the id exists, the same broken entry reads as a duplicate.
        dataset
            .apply_candidates(&CandidateCatalog::new(vec![candidate("model_b")]))
            .expect("add model_b");
        let outcomes = dataset.apply_candidates(&catalog).expect("rerun");
        assert_eq!(outcomes[1].status, OutcomeStatus::SkippedDuplicate);
        assert_eq!(dataset.lengths(), [2, 2, 2, 2]);
    }
}
