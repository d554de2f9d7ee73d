//! Typed shapes of the four record kinds.
//!
//! Candidates are parsed into these types so a new model is schema-complete before it
//! reaches the store. Stored collections stay untyped (see [`Record`](super::Record)).
//! Fields these types do not name are kept in `extra` and written after the known ones.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::collection::Record;
use super::mileage::MileageLogic;

/// Make/model/generation row in the definitions collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub generation: String,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(flatten)]
    pub extra: Record,
}

impl ModelDefinition {
    /// Short human label, e.g. `TOYOTA Sienna`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }

    #[must_use]
    pub fn covers_year(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }
}

/// Market value snapshot and depreciation trend.
///
/// Currency amounts are kept as JSON numbers so integer prices are written back as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub model_id: String,
    /// Average price as of the dataset's reference date, which is part of the stored field name.
    #[serde(rename = "jan_2026_avg_price", alias = "price_snapshot")]
    pub price_snapshot: Number,
    pub depreciation_rate: f64,
    pub avg_annual_repair_cost: Number,
    pub depreciation_outlook: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_junk_value: Option<i64>,
    #[serde(flatten)]
    pub extra: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub mileage: u32,
    pub description: String,
    pub est_cost: Number,
    #[serde(flatten)]
    pub extra: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityRecord {
    pub model_id: String,
    pub score: u32,
    pub lifespan_miles: u32,
    #[serde(default)]
    pub best_years: Vec<i32>,
    #[serde(default)]
    pub worst_years: Vec<i32>,
    #[serde(default)]
    pub common_trouble_spots: Vec<String>,
    #[serde(default)]
    pub critical_milestones: Vec<Milestone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage_logic_text: Option<MileageLogic>,
    #[serde(flatten)]
    pub extra: Record,
}

/// A single known major fault. Field names follow the stored camelCase spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultEntry {
    pub component: String,
    pub symptoms: String,
    #[serde(rename = "repairCost")]
    pub repair_cost: Number,
    #[serde(rename = "verdictImplication")]
    pub verdict_implication: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_failure_mileage: Option<u32>,
    #[serde(flatten)]
    pub extra: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultRecord {
    pub model_id_ref: String,
    pub faults: Vec<FaultEntry>,
    #[serde(flatten)]
    pub extra: Record,
}
