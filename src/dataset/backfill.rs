//! Fills the optional `mileage_logic_text` field on reliability records.

use serde_json::Value;
use tracing::instrument;

use crate::catalog::MileageLogicTable;
use crate::constants::MILEAGE_LOGIC_FIELD;
use crate::error::{DatasetError, Result};
use crate::index::join_key;
use crate::io::{CollectionPaths, CollectionStore};
use crate::types::{BackfillReport, CollectionKind, Record};

#[derive(Debug, Clone, Copy, Default)]
pub struct BackfillOptions {
    pub dry_run: bool,
}

/// Backfill driver bound to one store. Only the reliability collection is read or written.
#[derive(Debug)]
pub struct SparseFieldBackfill<'a> {
    store: &'a CollectionStore,
    options: BackfillOptions,
}

impl<'a> SparseFieldBackfill<'a> {
    #[must_use]
    pub fn new(store: &'a CollectionStore) -> Self {
        Self::with_options(store, BackfillOptions::default())
    }

    #[must_use]
    pub fn with_options(store: &'a CollectionStore, options: BackfillOptions) -> Self {
        Self { store, options }
    }

    /// Persists the reliability collection only if at least one record changed.
    #[instrument(skip_all, fields(entries = table.len(), dry_run = self.options.dry_run))]
    pub fn run(&self, table: &MileageLogicTable) -> Result<BackfillReport> {
        let mut records = self.store.load(CollectionKind::Reliability)?;
        let mut report = backfill_records(&mut records, table)?;
        report.dry_run = self.options.dry_run;

        if !report.updated.is_empty() && !self.options.dry_run {
            self.store.save(CollectionKind::Reliability, &records)?;
            report.persisted = true;
        }

        tracing::info!(
            updated = report.updated_count(),
            already_populated = report.already_populated,
            unmatched = report.unmatched,
            persisted = report.persisted,
            "backfill finished"
        );
        Ok(report)
    }
}

/// Runs one backfill pass against the reliability collection at `paths`.
pub fn run(paths: &CollectionPaths, table: &MileageLogicTable) -> Result<BackfillReport> {
    let store = CollectionStore::new(paths.clone());
    SparseFieldBackfill::new(&store).run(table)
}

/// Whether a stored `mileage_logic_text` value counts as absent.
///
/// Null and empty containers or strings are treated the same as a missing field.
#[must_use]
pub fn is_unpopulated(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Fills the field in place. Records already populated or without a lookup entry are
/// left exactly as they were, and no record is added or removed.
pub fn backfill_records(
    records: &mut [Record],
    table: &MileageLogicTable,
) -> Result<BackfillReport> {
    let field = CollectionKind::Reliability.join_field();
    let mut report = BackfillReport::default();

    for (position, record) in records.iter_mut().enumerate() {
        let model_id = join_key(record, field)
            .ok_or(DatasetError::MissingKey {
                collection: CollectionKind::Reliability,
                position,
                field,
            })?
            .to_owned();

        if !is_unpopulated(record.get(MILEAGE_LOGIC_FIELD)) {
            report.already_populated += 1;
            continue;
        }

        match table.get(&model_id) {
            Some(logic) if !logic.is_empty() => {
                record.insert(MILEAGE_LOGIC_FIELD.to_owned(), logic.to_value());
                tracing::info!(model_id = %model_id, "added mileage_logic_text");
                report.updated.push(model_id);
            }
            Some(_) => {
                tracing::warn!(model_id = %model_id, "lookup entry is empty; not applied");
                report.unmatched += 1;
            }
            None => report.unmatched += 1,
        }
    }
    Ok(report)
}
