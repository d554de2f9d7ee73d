//! Mileage-threshold advice attached to reliability records.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One threshold and the advice that applies once a vehicle passes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MileageNote {
    pub mileage: String,
    pub advice: String,
}

/// Ordered mapping of mileage threshold to advisory text.
///
/// Serialized as a JSON object. Insertion order is significant and preserved on both
/// read and write; ascending mileage is expected but not enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MileageLogic(Vec<MileageNote>);

impl MileageLogic {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a threshold, replacing the advice in place if the threshold already exists.
    pub fn push(&mut self, mileage: impl Into<String>, advice: impl Into<String>) {
        let mileage = mileage.into();
        let advice = advice.into();
        match self.0.iter_mut().find(|note| note.mileage == mileage) {
            Some(note) => note.advice = advice,
            None => self.0.push(MileageNote { mileage, advice }),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MileageNote> {
        self.0.iter()
    }

    #[must_use]
    pub fn get(&self, mileage: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|note| note.mileage == mileage)
            .map(|note| note.advice.as_str())
    }

    /// Whether the thresholds parse as integers in strictly ascending order.
    #[must_use]
    pub fn is_ascending(&self) -> bool {
        let parsed: Option<Vec<u64>> = self.0.iter().map(|n| n.mileage.parse().ok()).collect();
        match parsed {
            Some(values) => values.windows(2).all(|w| w[0] < w[1]),
            None => false,
        }
    }

    /// JSON object form, in insertion order.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|note| (note.mileage.clone(), Value::String(note.advice.clone())))
            .collect();
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MileageLogic {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut logic = MileageLogic::new();
        for (mileage, advice) in iter {
            logic.push(mileage, advice);
        }
        logic
    }
}

impl Serialize for MileageLogic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for note in &self.0 {
            map.serialize_entry(&note.mileage, &note.advice)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MileageLogic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NotesVisitor;

        impl<'de> Visitor<'de> for NotesVisitor {
            type Value = MileageLogic;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping mileage thresholds to advice")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut logic = MileageLogic::new();
                while let Some((mileage, advice)) = access.next_entry::<String, String>()? {
                    logic.push(mileage, advice);
                }
                Ok(logic)
            }
        }

        deserializer.deserialize_map(NotesVisitor)
    }
}
