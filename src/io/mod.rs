//! On-disk representation of the collections.

pub mod document;
pub mod store;

pub use document::{decode_records, encode_records, strip_bom};
pub use store::{CollectionPaths, CollectionStore};
