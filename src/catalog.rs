//! Authored input data: candidate models for injection and the mileage advice table.
//!
//! Both are loaded from JSON files rather than compiled in, so batches can be
//! prepared and reviewed as data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::MAX_RELIABILITY_SCORE;
use crate::error::{CandidateRejection, DatasetError, KeyMismatch, Result};
use crate::io::document::{json_type_name, strip_bom};
use crate::types::{
    CollectionKind, FaultRecord, MarketRecord, MileageLogic, ModelDefinition, Record,
    ReliabilityRecord,
};

/// One proposed model: a record for each of the four collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub model_def: ModelDefinition,
    pub market: MarketRecord,
    pub reliability: ReliabilityRecord,
    pub faults: FaultRecord,
}

impl Candidate {
    /// Join key shared by all four records: the definition id.
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_def.id
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.model_def.label()
    }

    /// Join key each sub-record carries, in [`CollectionKind::ALL`] order.
    #[must_use]
    pub fn join_keys(&self) -> [(CollectionKind, &str); 4] {
        [
            (CollectionKind::Models, self.model_def.id.as_str()),
            (CollectionKind::Market, self.market.model_id.as_str()),
            (CollectionKind::Reliability, self.reliability.model_id.as_str()),
            (CollectionKind::Faults, self.faults.model_id_ref.as_str()),
        ]
    }

    /// Verifies the four records reference the definition id.
    pub fn check_keys(&self) -> std::result::Result<(), CandidateRejection> {
        let expected = self.model_id();
        let mismatches: Vec<KeyMismatch> = self
            .join_keys()
            .into_iter()
            .filter(|(_, key)| *key != expected)
            .map(|(collection, key)| KeyMismatch {
                collection,
                field: collection.join_field(),
                found: key.to_owned(),
            })
            .collect();

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(CandidateRejection::KeyConsistency {
                expected: expected.to_owned(),
                mismatches,
            })
        }
    }

    /// Value-level checks a well-formed candidate must pass.
    pub fn check_schema(&self) -> std::result::Result<(), CandidateRejection> {
        let schema = |reason: String| Err(CandidateRejection::Schema { reason });
        let def = &self.model_def;

        if def.id.trim().is_empty() {
            return schema("definition id is blank".into());
        }
        if def.start_year > def.end_year {
            return schema(format!(
                "start_year {} is after end_year {}",
                def.start_year, def.end_year
            ));
        }
        for (field, years) in [
            ("best_years", &self.reliability.best_years),
            ("worst_years", &self.reliability.worst_years),
        ] {
            if let Some(year) = years.iter().find(|y| !def.covers_year(**y)) {
                return schema(format!(
                    "{field} contains {year}, outside {}..={}",
                    def.start_year, def.end_year
                ));
            }
        }
        if self.reliability.score > MAX_RELIABILITY_SCORE {
            return schema(format!(
                "score {} exceeds {MAX_RELIABILITY_SCORE}",
                self.reliability.score
            ));
        }
        let rate = self.market.depreciation_rate;
        if !(0.0..=1.0).contains(&rate) {
            return schema(format!("depreciation_rate {rate} is outside 0..=1"));
        }
        for fault in &self.faults.faults {
            if let Some(rate) = fault.occurrence_rate {
                if !(0.0..=1.0).contains(&rate) {
                    return schema(format!(
                        "occurrence_rate {rate} of `{}` is outside 0..=1",
                        fault.component
                    ));
                }
            }
        }
        Ok(())
    }

    /// Key consistency first, then schema.
    pub fn validate(&self) -> std::result::Result<(), CandidateRejection> {
        self.check_keys()?;
        self.check_schema()
    }

    /// Dotted paths of fields no record type names. They are stored as given.
    #[must_use]
    pub fn unknown_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        let mut note = |prefix: &str, extra: &Record| {
            fields.extend(extra.keys().map(|key| format!("{prefix}.{key}")));
        };
        note("model_def", &self.model_def.extra);
        note("market", &self.market.extra);
        note("reliability", &self.reliability.extra);
        for (i, milestone) in self.reliability.critical_milestones.iter().enumerate() {
            note(&format!("reliability.critical_milestones[{i}]"), &milestone.extra);
        }
        note("faults", &self.faults.extra);
        for (i, fault) in self.faults.faults.iter().enumerate() {
            note(&format!("faults.faults[{i}]"), &fault.extra);
        }
        fields
    }

    /// The four stored records, in [`CollectionKind::ALL`] order.
    ///
    /// Either all four records are produced or none are.
    pub fn to_records(&self) -> Result<[Record; 4]> {
        Ok([
            to_record(&self.model_def)?,
            to_record(&self.market)?,
            to_record(&self.reliability)?,
            to_record(&self.faults)?,
        ])
    }
}

fn to_record<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(record) => Ok(record),
        other => Err(DatasetError::Json(serde::ser::Error::custom(format!(
            "record serialized to {}",
            json_type_name(&other)
        )))),
    }
}

/// Entry key holding each collection's record, in [`CollectionKind::ALL`] order.
const ENTRY_SECTIONS: [(&str, CollectionKind); 4] = [
    ("model_def", CollectionKind::Models),
    ("market", CollectionKind::Market),
    ("reliability", CollectionKind::Reliability),
    ("faults", CollectionKind::Faults),
];

/// A catalog entry that could not be turned into a [`Candidate`].
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadableCandidate {
    /// Index of the entry in the catalog array.
    pub position: usize,
    /// Definition id when the entry has one, otherwise `#<position>`.
    pub model_id: String,
    pub label: String,
    pub rejection: CandidateRejection,
}

impl UnreadableCandidate {
    fn from_entry(position: usize, entry: &Value, rejection: CandidateRejection) -> Self {
        let def = entry.get("model_def");
        let field = |name: &str| def.and_then(|d| d.get(name)).and_then(Value::as_str);
        let model_id = field("id").map_or_else(|| format!("#{position}"), str::to_owned);
        let label = match (field("brand"), field("model")) {
            (Some(brand), Some(model)) => format!("{brand} {model}"),
            _ => model_id.clone(),
        };
        Self {
            position,
            model_id,
            label,
            rejection,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntry {
    Candidate(Candidate),
    Unreadable(UnreadableCandidate),
}

impl CatalogEntry {
    /// Parses one entry on its own so a bad entry never spoils its neighbours.
    ///
    /// A join key that is absent or not a string is a key-consistency rejection; any
    /// other shape problem is a schema rejection.
    #[must_use]
    pub fn from_value(position: usize, entry: Value) -> Self {
        match parse_candidate(&entry) {
            Ok(candidate) => CatalogEntry::Candidate(candidate),
            Err(rejection) => CatalogEntry::Unreadable(UnreadableCandidate::from_entry(
                position, &entry, rejection,
            )),
        }
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        match self {
            CatalogEntry::Candidate(candidate) => candidate.model_id(),
            CatalogEntry::Unreadable(entry) => &entry.model_id,
        }
    }
}

fn parse_candidate(entry: &Value) -> std::result::Result<Candidate, CandidateRejection> {
    if !entry.is_object() {
        return Err(CandidateRejection::Schema {
            reason: format!("entry is {}, expected an object", json_type_name(entry)),
        });
    }

    let mismatches: Vec<KeyMismatch> = ENTRY_SECTIONS
        .into_iter()
        .filter_map(|(section, collection)| {
            let field = collection.join_field();
            match entry.get(section).and_then(|record| record.get(field)) {
                Some(Value::String(_)) => None,
                other => Some(KeyMismatch {
                    collection,
                    field,
                    found: other.map_or_else(|| "<missing>".to_owned(), Value::to_string),
                }),
            }
        })
        .collect();
    if !mismatches.is_empty() {
        let expected = entry
            .get("model_def")
            .and_then(|def| def.get("id"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(CandidateRejection::KeyConsistency {
            expected: expected.to_owned(),
            mismatches,
        });
    }

    Candidate::deserialize(entry).map_err(|err| CandidateRejection::Schema {
        reason: err.to_string(),
    })
}

/// Ordered batch of catalog entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateCatalog {
    entries: Vec<CatalogEntry>,
}

impl CandidateCatalog {
    #[must_use]
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            entries: candidates.into_iter().map(CatalogEntry::Candidate).collect(),
        }
    }

    /// Reads a JSON array of candidates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs_err::read(path)?;
        Self::from_slice(path, &bytes)
    }

    /// `origin` is only used in error messages.
    ///
    /// Only a file that is not a JSON array fails as a whole; malformed entries are
    /// kept as [`CatalogEntry::Unreadable`] and rejected one by one during injection.
    pub fn from_slice(origin: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self> {
        let entries = serde_json::from_slice::<Value>(strip_bom(bytes))
            .map_err(|err| err.to_string())
            .and_then(|value| match value {
                Value::Array(entries) => Ok(entries),
                other => Err(format!(
                    "expected a top-level array, found {}",
                    json_type_name(&other)
                )),
            })
            .map_err(|reason| DatasetError::InvalidCatalog {
                path: origin.into(),
                reason,
            })?;

        let entries: Vec<CatalogEntry> = entries
            .into_iter()
            .enumerate()
            .map(|(position, entry)| CatalogEntry::from_value(position, entry))
            .collect();
        let unreadable = entries
            .iter()
            .filter(|entry| matches!(entry, CatalogEntry::Unreadable(_)))
            .count();
        if unreadable > 0 {
            tracing::warn!(unreadable, total = entries.len(), "catalog has unreadable entries");
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Entries that parsed into a [`Candidate`].
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter().filter_map(|entry| match entry {
            CatalogEntry::Candidate(candidate) => Some(candidate),
            CatalogEntry::Unreadable(_) => None,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<Candidate>> for CandidateCatalog {
    fn from(candidates: Vec<Candidate>) -> Self {
        Self::new(candidates)
    }
}

impl<'a> IntoIterator for &'a CandidateCatalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Mileage advice keyed by `model_id`, used by the backfill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MileageLogicTable {
    entries: BTreeMap<String, MileageLogic>,
}

impl MileageLogicTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON object of `model_id -> { mileage -> advice }`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs_err::read(path)?;
        Self::from_slice(path, &bytes)
    }

    pub fn from_slice(origin: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(strip_bom(bytes)).map_err(|err| DatasetError::InvalidLookup {
            path: origin.into(),
            reason: err.to_string(),
        })
    }

    pub fn insert(&mut self, model_id: impl Into<String>, logic: MileageLogic) {
        self.entries.insert(model_id.into(), logic);
    }

    #[must_use]
    pub fn get(&self, model_id: &str) -> Option<&MileageLogic> {
        self.entries.get(model_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, MileageLogic)> for MileageLogicTable {
    fn from_iter<I: IntoIterator<Item = (K, MileageLogic)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (model_id, logic) in iter {
            table.insert(model_id, logic);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIENNA: &str = r#"[{
        "model_def": {"id": "toyota_sienna_xl30", "brand": "TOYOTA", "model": "Sienna", "generation": "3rd Gen", "start_year": 2011, "end_year": 2020},
        "market": {"model_id": "toyota_sienna_xl30", "jan_2026_avg_price": 18500, "depreciation_rate": 0.08, "avg_annual_repair_cost": 550, "depreciation_outlook": "Low"},
        "reliability": {"model_id": "toyota_sienna_xl30", "score": 82, "lifespan_miles": 300000, "best_years": [2015, 2016], "worst_years": [2011], "common_trouble_spots": ["Sliding Door Cables", "Transmission Flare"], "critical_milestones": [{"mileage": 120000, "description": "Spark Plugs (Intake Removal Needed)", "est_cost": 650}]},
        "faults": {"model_id_ref": "toyota_sienna_xl30", "faults": [{"component": "Power Sliding Door Failure", "symptoms": "Door won't open or close automatically", "repairCost": 1600, "verdictImplication": "Moderate: Common convenience failure."}]}
    }]"#;

    fn sienna() -> Candidate {
        let catalog = CandidateCatalog::from_slice("batch.json", SIENNA.as_bytes()).expect("parse");
        catalog.candidates().next().cloned().expect("one candidate")
    }

    #[test]
    fn parses_candidate_batch_layout() {
        let candidate = sienna();
        assert_eq!(candidate.model_id(), "toyota_sienna_xl30");
        assert_eq!(candidate.label(), "TOYOTA Sienna");
        assert!(candidate.validate().is_ok());
    }

    #[test]
    fn records_come_out_in_collection_order() {
        let [def, market, reliability, faults] = sienna().to_records().expect("records");
        assert_eq!(def["id"], "toyota_sienna_xl30");
        assert_eq!(market["model_id"], "toyota_sienna_xl30");
        assert_eq!(market["jan_2026_avg_price"], 18500);
        assert_eq!(reliability["score"], 82);
        assert!(reliability.get("mileage_logic_text").is_none());
        assert_eq!(faults["model_id_ref"], "toyota_sienna_xl30");
    }

    #[test]
    fn every_disagreeing_key_is_reported() {
        let mut candidate = sienna();
        candidate.market.model_id = "model_x".into();
        candidate.faults.model_id_ref = "model_z".into();

        match candidate.validate() {
            Err(CandidateRejection::KeyConsistency { expected, mismatches }) => {
                assert_eq!(expected, "toyota_sienna_xl30");
                let kinds: Vec<_> = mismatches.iter().map(|m| m.collection).collect();
                assert_eq!(kinds, [CollectionKind::Market, CollectionKind::Faults]);
                assert_eq!(mismatches[1].field, "model_id_ref");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn schema_rejects_years_outside_generation() {
        let mut candidate = sienna();
        candidate.reliability.worst_years.push(2024);
        let err = candidate.validate().expect_err("2024 is outside 2011..=2020");
        match err {
            CandidateRejection::Schema { reason } => assert!(reason.contains("worst_years")),
            other => panic!("unexpected rejection: {other:?}"),
        }
    }

    #[test]
    fn schema_rejects_out_of_scale_values() {
        let mut candidate = sienna();
        candidate.reliability.score = 140;
        assert!(candidate.check_schema().is_err());

        let mut candidate = sienna();
        candidate.market.depreciation_rate = 1.5;
        assert!(candidate.check_schema().is_err());
    }

    #[test]
    fn catalog_that_is_not_an_array_names_its_file() {
        let err = CandidateCatalog::from_slice("batch_2.json", br#"{"model_def": {}}"#)
            .expect_err("object instead of array");
        match err {
            DatasetError::InvalidCatalog { path, reason } => {
                assert!(path.ends_with("batch_2.json"));
                assert!(reason.contains("top-level array"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_join_key_is_a_key_consistency_rejection() {
        let mut entry: Value = serde_json::from_str(SIENNA).expect("parse");
        let entry = entry[0].take();
        let mut broken = entry.clone();
        broken["market"]
            .as_object_mut()
            .expect("market object")
            .remove("model_id");
        broken["faults"]["model_id_ref"] = Value::from(7);

        match CatalogEntry::from_value(3, broken) {
            CatalogEntry::Unreadable(unreadable) => {
                assert_eq!(unreadable.position, 3);
                assert_eq!(unreadable.model_id, "toyota_sienna_xl30");
                assert_eq!(unreadable.label, "TOYOTA Sienna");
                match unreadable.rejection {
                    CandidateRejection::KeyConsistency { mismatches, .. } => {
                        let found: Vec<_> = mismatches.iter().map(|m| m.found.as_str()).collect();
                        assert_eq!(found, ["<missing>", "7"]);
                    }
                    other => panic!("unexpected rejection: {other:?}"),
                }
            }
            CatalogEntry::Candidate(_) => panic!("entry should not parse"),
        }

        let mut no_price = entry;
        no_price["market"]
            .as_object_mut()
            .expect("market object")
            .remove("jan_2026_avg_price");
        match CatalogEntry::from_value(0, no_price) {
            CatalogEntry::Unreadable(unreadable) => assert!(matches!(
                unreadable.rejection,
                CandidateRejection::Schema { .. }
            )),
            CatalogEntry::Candidate(_) => panic!("entry should not parse"),
        }
    }

    #[test]
    fn entry_without_definition_id_is_named_by_position() {
        let raw = br#"[{"model_def": {"brand": "FORD"}}, 12]"#;
        let catalog = CandidateCatalog::from_slice("batch.json", raw).expect("array parses");
        let ids: Vec<_> = catalog.iter().map(CatalogEntry::model_id).collect();
        assert_eq!(ids, ["#0", "#1"]);
        assert_eq!(catalog.candidates().count(), 0);
    }

    #[test]
    fn unknown_fields_are_listed_and_stored() {
        let mut candidate = sienna();
        candidate
            .market
            .extra
            .insert("analyst_note".into(), Value::from("keep me"));
        candidate.faults.faults[0]
            .extra
            .insert("occurence_rate".into(), Value::from(0.4));

        assert_eq!(
            candidate.unknown_fields(),
            ["market.analyst_note", "faults.faults[0].occurence_rate"]
        );
        let [_, market, _, faults] = candidate.to_records().expect("records");
        assert_eq!(market["analyst_note"], "keep me");
        assert_eq!(faults["faults"][0]["occurence_rate"], 0.4);
    }

    #[test]
    fn lookup_table_preserves_advice_order() {
        let raw = br#"{"mazda3_bm": {"80000": "Maintain.", "120000": "Clutch.", "180000": "Rust."}}"#;
        let table = MileageLogicTable::from_slice("mileage.json", raw).expect("parse");
        let logic = table.get("mazda3_bm").expect("entry");
        let order: Vec<_> = logic.iter().map(|n| n.mileage.as_str()).collect();
        assert_eq!(order, ["80000", "120000", "180000"]);
        assert!(table.get("volvo_xc90_spa").is_none());
    }
}
