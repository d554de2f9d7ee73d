use std::path::PathBuf;

use thiserror::Error;

use crate::types::CollectionKind;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Structural failures. Any of these aborts the run before a single byte is written.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("{collection} collection not found at {}", path.display())]
    NotFound {
        collection: CollectionKind,
        path: PathBuf,
    },

    #[error("{collection} collection at {} is malformed: {reason}", path.display())]
    Malformed {
        collection: CollectionKind,
        path: PathBuf,
        reason: String,
    },

    #[error("{collection} record #{position} has no string `{field}` key")]
    MissingKey {
        collection: CollectionKind,
        position: usize,
        field: &'static str,
    },

    #[error("{collection} collection already holds key `{key}` more than once")]
    DuplicateKey {
        collection: CollectionKind,
        key: String,
    },

    #[error(
        "collections are not co-indexed: models={models} market={market} reliability={reliability} faults={faults}"
    )]
    Misaligned {
        models: usize,
        market: usize,
        reliability: usize,
        faults: usize,
    },

    #[error("candidate catalog {} is invalid: {reason}", path.display())]
    InvalidCatalog { path: PathBuf, reason: String },

    #[error("mileage lookup table {} is invalid: {reason}", path.display())]
    InvalidLookup { path: PathBuf, reason: String },

    #[error("configuration error: {reason}")]
    Config { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single candidate model was left out of a batch.
///
/// These never abort the batch; they end up in the per-model report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateRejection {
    #[error("join keys disagree with definition id `{expected}`: {}", describe_mismatches(mismatches))]
    KeyConsistency {
        expected: String,
        mismatches: Vec<KeyMismatch>,
    },

    #[error("key already present in {} without a model definition", describe_kinds(collections))]
    KeyConflict { collections: Vec<CollectionKind> },

    #[error("schema check failed: {reason}")]
    Schema { reason: String },
}

/// One sub-record whose join key does not match the candidate's definition id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMismatch {
    pub collection: CollectionKind,
    pub field: &'static str,
    pub found: String,
}

fn describe_mismatches(mismatches: &[KeyMismatch]) -> String {
    mismatches
        .iter()
        .map(|m| format!("{}.{} = `{}`", m.collection, m.field, m.found))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_kinds(kinds: &[CollectionKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.name())
        .collect::<Vec<_>>()
        .join(", ")
}
