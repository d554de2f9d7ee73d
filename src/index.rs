//! In-memory key sets used for idempotent insert decisions.

use std::collections::HashSet;

use crate::error::{DatasetError, Result};
use crate::types::{CollectionKind, Record};

/// Set of join keys present in one collection. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    keys: HashSet<String>,
}

impl IdentityIndex {
    /// Collects `key_field` from every record.
    ///
    /// A record without a string key, or a key seen twice, means the collection is
    /// corrupt; both fail the build instead of being skipped.
    pub fn build(
        collection: CollectionKind,
        records: &[Record],
        key_field: &'static str,
    ) -> Result<Self> {
        let mut keys = HashSet::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            let key = join_key(record, key_field).ok_or(DatasetError::MissingKey {
                collection,
                position,
                field: key_field,
            })?;
            if !keys.insert(key.to_owned()) {
                return Err(DatasetError::DuplicateKey {
                    collection,
                    key: key.to_owned(),
                });
            }
        }
        Ok(Self { keys })
    }

    /// Index over a collection's own join field.
    pub fn for_collection(collection: CollectionKind, records: &[Record]) -> Result<Self> {
        Self::build(collection, records, collection.join_field())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Returns `false` if the key was already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// String value of `field`, if the record has one.
#[must_use]
pub fn join_key<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(serde_json::Value::as_str)
}
