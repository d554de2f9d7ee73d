//! Decoding and encoding of collection documents.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::constants::{DOCUMENT_INDENT, UTF8_BOM};
use crate::error::{DatasetError, Result};
use crate::types::{CollectionKind, Record};

/// Drops a leading UTF-8 byte-order mark, if any.
#[must_use]
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Parses a collection document: a top-level array whose elements are all objects.
pub fn decode_records(
    collection: CollectionKind,
    path: &Path,
    bytes: &[u8],
) -> Result<Vec<Record>> {
    let malformed = |reason: String| DatasetError::Malformed {
        collection,
        path: path.to_path_buf(),
        reason,
    };

    let value: Value =
        serde_json::from_slice(strip_bom(bytes)).map_err(|err| malformed(err.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(malformed(format!(
                "expected a top-level array, found {}",
                json_type_name(&other)
            )));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(malformed(format!(
                "element #{position} is {}, expected an object",
                json_type_name(&other)
            ))),
        })
        .collect()
}

/// Serializes records with fixed indentation and no byte-order mark.
pub fn encode_records(records: &[Record]) -> Result<Vec<u8>> {
    encode_pretty(records)
}

pub(crate) fn encode_pretty<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(DOCUMENT_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(bytes: &[u8]) -> Result<Vec<Record>> {
        decode_records(CollectionKind::Models, Path::new("car_models.json"), bytes)
    }

    #[test]
    fn tolerates_byte_order_mark() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(br#"[{"id": "mazda3_bm"}]"#);
        let records = decode(&bytes).expect("decode");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "mazda3_bm");
    }

    #[test]
    fn rejects_top_level_object() {
        let err = decode(br#"{"id": "mazda3_bm"}"#).expect_err("object should fail");
        match err {
            DatasetError::Malformed { collection, reason, .. } => {
                assert_eq!(collection, CollectionKind::Models);
                assert!(reason.contains("top-level array"), "unexpected reason: {reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_object_elements() {
        let err = decode(br#"[{"id": "a"}, 7]"#).expect_err("number element should fail");
        assert!(matches!(
            err,
            DatasetError::Malformed { ref reason, .. } if reason.contains("element #1")
        ));
    }

    #[test]
    fn rejects_unparseable_text() {
        let err = decode(b"[{\"id\": ").expect_err("truncated json");
        assert!(matches!(err, DatasetError::Malformed { .. }));
    }

    #[test]
    fn encodes_with_four_space_indent_and_stable_key_order() {
        let record = json!({"id": "volvo_xc90_spa", "brand": "VOLVO", "start_year": 2016});
        let Value::Object(record) = record else { unreachable!() };
        let bytes = encode_records(&[record]).expect("encode");
        let text = String::from_utf8(bytes).expect("utf8");
        assert!(text.starts_with("[\n    {\n        \"id\""), "got: {text}");
        assert!(text.find("\"id\"").unwrap() < text.find("\"brand\"").unwrap());
        assert!(text.find("\"brand\"").unwrap() < text.find("\"start_year\"").unwrap());
        assert!(!text.as_bytes().starts_with(UTF8_BOM));
    }
}
