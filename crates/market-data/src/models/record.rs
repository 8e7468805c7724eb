//! Attribute values and the partial records providers, the engine and the
//! cache exchange.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::Attribute;

/// A single resolved (or unresolved) attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    /// Values keyed by period, e.g. yearly net profit keyed by year.
    Series(BTreeMap<String, f64>),
    /// Recognized by the source but not resolved.
    Null,
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            AttributeValue::Number(value)
        } else {
            AttributeValue::Null
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<BTreeMap<String, f64>> for AttributeValue {
    fn from(value: BTreeMap<String, f64>) -> Self {
        if value.is_empty() {
            AttributeValue::Null
        } else {
            AttributeValue::Series(value)
        }
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}

/// A partial mapping of attributes to values.
///
/// A key holding [`AttributeValue::Null`] means "recognized but unresolved";
/// an absent key means "not requested or not attempted yet".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeRecord(BTreeMap<Attribute, AttributeValue>);

impl AttributeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.0.get(&attribute)
    }

    pub fn insert(&mut self, attribute: Attribute, value: impl Into<AttributeValue>) {
        self.0.insert(attribute, value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Attribute, &AttributeValue)> {
        self.0.iter()
    }

    /// True when `attribute` is present with a non-null value.
    pub fn is_resolved(&self, attribute: Attribute) -> bool {
        self.0.get(&attribute).is_some_and(|v| !v.is_null())
    }

    /// Merges `newer` into this record.
    ///
    /// Keys from `newer` win, except that a null never replaces a value that is
    /// already resolved. Keys only present here are kept.
    pub fn merge(&mut self, newer: AttributeRecord) {
        for (attribute, value) in newer.0 {
            if value.is_null() && self.is_resolved(attribute) {
                continue;
            }
            self.0.insert(attribute, value);
        }
    }

    /// Returns a copy of this record holding only the given attributes.
    pub fn restricted_to(&self, attributes: &[Attribute]) -> AttributeRecord {
        AttributeRecord(
            self.0
                .iter()
                .filter(|(attribute, _)| attributes.contains(attribute))
                .map(|(attribute, value)| (*attribute, value.clone()))
                .collect(),
        )
    }

    /// The requested attributes that are absent or null, in request order.
    pub fn missing(&self, requested: &[Attribute]) -> Vec<Attribute> {
        requested
            .iter()
            .copied()
            .filter(|attribute| !self.is_resolved(*attribute))
            .collect()
    }

    pub fn is_complete_for(&self, requested: &[Attribute]) -> bool {
        requested.iter().all(|attribute| self.is_resolved(*attribute))
    }

    /// Ordered view over the requested attributes; keys absent here are skipped.
    pub fn project(&self, requested: &[Attribute]) -> OrderedRecord {
        OrderedRecord(
            requested
                .iter()
                .filter_map(|attribute| {
                    self.0
                        .get(attribute)
                        .map(|value| (*attribute, value.clone()))
                })
                .collect(),
        )
    }
}

impl FromIterator<(Attribute, AttributeValue)> for AttributeRecord {
    fn from_iter<I: IntoIterator<Item = (Attribute, AttributeValue)>>(iter: I) -> Self {
        AttributeRecord(iter.into_iter().collect())
    }
}

impl IntoIterator for AttributeRecord {
    type Item = (Attribute, AttributeValue);
    type IntoIter = std::collections::btree_map::IntoIter<Attribute, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Attribute/value pairs that serialize as a JSON object in their own order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderedRecord(Vec<(Attribute, AttributeValue)>);

impl OrderedRecord {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.0.iter().map(|(attribute, _)| *attribute)
    }

    pub fn get(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.0
            .iter()
            .find(|(candidate, _)| *candidate == attribute)
            .map(|(_, value)| value)
    }
}

impl Serialize for OrderedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (attribute, value) in &self.0 {
            map.serialize_entry(attribute.as_str(), value)?;
        }
        map.end()
    }
}
