//! The four collections held in memory for one read-modify-write run.
//!
//! Responsibilities:
//! - Load every collection up front so structural errors abort before any mutation.
//! - Apply synchronized inserts, sparse backfills, and read-only integrity checks.
//! - Hand modified collections back to the store in a single staged save.

pub mod backfill;
pub mod inject;
pub mod verify;

use crate::error::{DatasetError, Result};
use crate::index::IdentityIndex;
use crate::io::CollectionStore;
use crate::types::{CollectionKind, Record};

pub use backfill::{BackfillOptions, SparseFieldBackfill, backfill_records};
pub use inject::{InjectOptions, SynchronizedInserter, run};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    models: Vec<Record>,
    market: Vec<Record>,
    reliability: Vec<Record>,
    faults: Vec<Record>,
}

impl Dataset {
    #[must_use]
    pub fn new(
        models: Vec<Record>,
        market: Vec<Record>,
        reliability: Vec<Record>,
        faults: Vec<Record>,
    ) -> Self {
        Self {
            models,
            market,
            reliability,
            faults,
        }
    }

    /// Loads all four collections. The first missing or malformed file aborts.
    pub fn load(store: &CollectionStore) -> Result<Self> {
        Ok(Self {
            models: store.load(CollectionKind::Models)?,
            market: store.load(CollectionKind::Market)?,
            reliability: store.load(CollectionKind::Reliability)?,
            faults: store.load(CollectionKind::Faults)?,
        })
    }

    /// Writes all four collections as one staged unit.
    pub fn save(&self, store: &CollectionStore) -> Result<()> {
        let batch: Vec<(CollectionKind, &[Record])> = CollectionKind::ALL
            .into_iter()
            .map(|kind| (kind, self.records(kind)))
            .collect();
        store.save_many(&batch)
    }

    #[must_use]
    pub fn records(&self, collection: CollectionKind) -> &[Record] {
        match collection {
            CollectionKind::Models => &self.models,
            CollectionKind::Market => &self.market,
            CollectionKind::Reliability => &self.reliability,
            CollectionKind::Faults => &self.faults,
        }
    }

    pub(crate) fn records_mut(&mut self, collection: CollectionKind) -> &mut Vec<Record> {
        match collection {
            CollectionKind::Models => &mut self.models,
            CollectionKind::Market => &mut self.market,
            CollectionKind::Reliability => &mut self.reliability,
            CollectionKind::Faults => &mut self.faults,
        }
    }

    /// Number of model definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Collection lengths in [`CollectionKind::ALL`] order.
    #[must_use]
    pub fn lengths(&self) -> [usize; 4] {
        CollectionKind::ALL.map(|kind| self.records(kind).len())
    }

    #[must_use]
    pub fn is_co_indexed(&self) -> bool {
        let [models, market, reliability, faults] = self.lengths();
        models == market && models == reliability && models == faults
    }

    /// Fails with [`DatasetError::Misaligned`] unless all four lengths agree.
    pub fn ensure_co_indexed(&self) -> Result<()> {
        if self.is_co_indexed() {
            return Ok(());
        }
        let [models, market, reliability, faults] = self.lengths();
        Err(DatasetError::Misaligned {
            models,
            market,
            reliability,
            faults,
        })
    }

    /// Index of existing join keys in one collection.
    pub fn index(&self, collection: CollectionKind) -> Result<IdentityIndex> {
        IdentityIndex::for_collection(collection, self.records(collection))
    }
}
