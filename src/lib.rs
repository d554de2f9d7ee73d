#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::float_cmp
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Lint exceptions allowed crate-wide:
//
// Documentation lints: most operations return the single crate error type.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Pattern matching: these pedantic lints often suggest changes that reduce clarity.
#![allow(clippy::manual_let_else)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::collapsible_if)]
//
// Ergonomics:
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::format_push_string)] // report rendering
#![allow(clippy::implicit_hasher)]
#![allow(clippy::unnecessary_wraps)]

//! Synchronized insert and sparse backfill over the four vehicle reference collections.
//!
//! Model definitions, market data, reliability data and fault data live in four
//! separate JSON documents that must stay key-aligned. This crate loads them as a
//! [`Dataset`], appends whole candidate models across all four, fills the optional
//! `mileage_logic_text` field from a lookup table, and checks cross-collection integrity.

/// The autofacts-core crate version (matches `Cargo.toml`).
pub const AUTOFACTS_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod catalog;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod index;
pub mod io;
pub mod types;

pub use catalog::{
    Candidate, CandidateCatalog, CatalogEntry, MileageLogicTable, UnreadableCandidate,
};
pub use config::{CollectionFiles, DatasetConfig};
pub use constants::*;
pub use dataset::{
    BackfillOptions, Dataset, InjectOptions, SparseFieldBackfill, SynchronizedInserter,
    backfill_records, run,
};
pub use error::{CandidateRejection, DatasetError, KeyMismatch, Result};
pub use index::{IdentityIndex, join_key};
pub use io::{CollectionPaths, CollectionStore, decode_records, encode_records, strip_bom};
pub use types::{
    BackfillReport, CollectionKind, FaultEntry, FaultRecord, FindingCode, FindingSeverity,
    InjectReport, IntegrityFinding, IntegrityReport, MarketRecord, MileageLogic, MileageNote,
    Milestone, ModelDefinition, ModelOutcome, OutcomeStatus, Record, ReliabilityRecord,
};
