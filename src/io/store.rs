//! Load/persist primitives for the four collection files.
//!
//! Every write goes through a temporary sibling file that is renamed over the target,
//! so a crash mid-write leaves the previous document intact. Multi-collection saves
//! stage every file before committing any of them.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use atomic_write_file::AtomicWriteFile;

use crate::error::{DatasetError, Result};
use crate::io::document::{decode_records, encode_records};
use crate::types::{CollectionKind, Record};

/// Resolved file location of each collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPaths {
    pub models: PathBuf,
    pub market: PathBuf,
    pub reliability: PathBuf,
    pub faults: PathBuf,
}

impl CollectionPaths {
    /// Standard file names inside one data directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            models: dir.join(CollectionKind::Models.default_file_name()),
            market: dir.join(CollectionKind::Market.default_file_name()),
            reliability: dir.join(CollectionKind::Reliability.default_file_name()),
            faults: dir.join(CollectionKind::Faults.default_file_name()),
        }
    }

    #[must_use]
    pub fn get(&self, collection: CollectionKind) -> &Path {
        match collection {
            CollectionKind::Models => &self.models,
            CollectionKind::Market => &self.market,
            CollectionKind::Reliability => &self.reliability,
            CollectionKind::Faults => &self.faults,
        }
    }
}

/// Reads and rewrites whole collection documents. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    paths: CollectionPaths,
}

impl CollectionStore {
    #[must_use]
    pub fn new(paths: CollectionPaths) -> Self {
        Self { paths }
    }

    #[must_use]
    pub fn paths(&self) -> &CollectionPaths {
        &self.paths
    }

    #[must_use]
    pub fn path(&self, collection: CollectionKind) -> &Path {
        self.paths.get(collection)
    }

    /// Reads one collection from disk.
    pub fn load(&self, collection: CollectionKind) -> Result<Vec<Record>> {
        let path = self.path(collection);
        let bytes = match fs_err::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(DatasetError::NotFound {
                    collection,
                    path: path.to_path_buf(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        let records = decode_records(collection, path, &bytes)?;
        tracing::debug!(
            collection = collection.name(),
            path = %path.display(),
            records = records.len(),
            "collection loaded"
        );
        Ok(records)
    }

    /// Replaces one collection file with `records`.
    pub fn save(&self, collection: CollectionKind, records: &[Record]) -> Result<()> {
        self.save_many(&[(collection, records)])
    }

    /// Replaces several collection files as one unit.
    ///
    /// All documents are written and synced to temporary files first. If any of them
    /// fails, every staged file is discarded and no target is touched.
    pub fn save_many(&self, batch: &[(CollectionKind, &[Record])]) -> Result<()> {
        let mut staged = Vec::with_capacity(batch.len());
        for (collection, records) in batch {
            match StagedDocument::prepare(*collection, self.path(*collection), records) {
                Ok(doc) => staged.push(doc),
                Err(err) => {
                    tracing::warn!(
                        collection = collection.name(),
                        error = %err,
                        "staging failed; discarding staged collections"
                    );
                    for doc in staged {
                        let collection = doc.collection;
                        if let Err(discard_err) = doc.discard() {
                            tracing::warn!(
                                collection = collection.name(),
                                error = %discard_err,
                                "failed to discard staged collection"
                            );
                        }
                    }
                    return Err(err);
                }
            }
        }

        for doc in staged {
            doc.commit()?;
        }
        Ok(())
    }
}

struct StagedDocument {
    collection: CollectionKind,
    records: usize,
    atomic: AtomicWriteFile,
}

impl StagedDocument {
    fn prepare(collection: CollectionKind, path: &Path, records: &[Record]) -> Result<Self> {
        let bytes = encode_records(records)?;
        let mut atomic = AtomicWriteFile::options().open(path)?;
        atomic.write_all(&bytes)?;
        atomic.flush()?;
        atomic.as_file().sync_all()?;
        Ok(Self {
            collection,
            records: records.len(),
            atomic,
        })
    }

    fn commit(self) -> Result<()> {
        tracing::debug!(
            collection = self.collection.name(),
            records = self.records,
            "committing collection"
        );
        self.atomic.commit().map_err(Into::into)
    }

    fn discard(self) -> Result<()> {
        self.atomic.discard().map_err(Into::into)
    }
}
