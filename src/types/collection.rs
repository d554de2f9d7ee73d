use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::constants::{FAULTS_FILE_NAME, MARKET_FILE_NAME, MODELS_FILE_NAME, RELIABILITY_FILE_NAME};

/// A stored record: an ordered JSON object.
///
/// Records are kept untyped on the store side so fields the tooling does not know
/// about are carried through a rewrite unchanged and in their original order.
pub type Record = Map<String, Value>;

/// The four parallel collections that together describe one vehicle model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKind {
    Models,
    Market,
    Reliability,
    Faults,
}

impl CollectionKind {
    /// Every collection, definitions first.
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Models,
        CollectionKind::Market,
        CollectionKind::Reliability,
        CollectionKind::Faults,
    ];

    /// Collections keyed by a foreign key into the definitions.
    pub const DEPENDENTS: [CollectionKind; 3] = [
        CollectionKind::Market,
        CollectionKind::Reliability,
        CollectionKind::Faults,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CollectionKind::Models => "models",
            CollectionKind::Market => "market",
            CollectionKind::Reliability => "reliability",
            CollectionKind::Faults => "faults",
        }
    }

    #[must_use]
    pub const fn default_file_name(self) -> &'static str {
        match self {
            CollectionKind::Models => MODELS_FILE_NAME,
            CollectionKind::Market => MARKET_FILE_NAME,
            CollectionKind::Reliability => RELIABILITY_FILE_NAME,
            CollectionKind::Faults => FAULTS_FILE_NAME,
        }
    }

    /// Field holding the join key in this collection.
    ///
    /// Fault records reference their model through `model_id_ref`; downstream readers
    /// depend on that spelling so it is kept as-is rather than unified.
    #[must_use]
    pub const fn join_field(self) -> &'static str {
        match self {
            CollectionKind::Models => "id",
            CollectionKind::Market | CollectionKind::Reliability => "model_id",
            CollectionKind::Faults => "model_id_ref",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown collection `{s}`"))
    }
}
