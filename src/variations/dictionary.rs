//! Ordered variation dictionary and its value type.

use serde::Serialize;
use std::collections::BTreeMap;

/// Name of the part selected when a multi-part value is used without `:part`.
pub const MAIN_PART: &str = "main";

/// A single variation value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VariationValue {
    /// A plain text value.
    Scalar(String),
    /// Named string parts (e.g. `main`, `lora`).
    Parts(BTreeMap<String, String>),
}

impl VariationValue {
    /// A value with no text: empty whole, empty for every part.
    pub fn empty() -> Self {
        VariationValue::Parts(BTreeMap::new())
    }

    /// Text used when the value is referenced without a part.
    ///
    /// Multi-part values use `main` when present, else the alphabetically
    /// first part.
    pub fn primary_text(&self) -> &str {
        match self {
            VariationValue::Scalar(text) => text,
            VariationValue::Parts(parts) => parts
                .get(MAIN_PART)
                .or_else(|| parts.values().next())
                .map(String::as_str)
                .unwrap_or(""),
        }
    }

    /// Look up a named part. Returns `None` for scalar values.
    pub fn part(&self, name: &str) -> Option<&str> {
        match self {
            VariationValue::Scalar(_) => None,
            VariationValue::Parts(parts) => Some(parts.get(name).map(String::as_str).unwrap_or("")),
        }
    }

    pub fn is_multi_part(&self) -> bool {
        matches!(self, VariationValue::Parts(_))
    }
}

impl From<&str> for VariationValue {
    fn from(value: &str) -> Self {
        VariationValue::Scalar(value.to_string())
    }
}

impl From<String> for VariationValue {
    fn from(value: String) -> Self {
        VariationValue::Scalar(value)
    }
}

/// An insertion-ordered mapping from variation key to value.
///
/// Each entry also remembers the source it came from, so merge conflicts can
/// name both contributors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariationDictionary {
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: VariationValue,
    source: String,
}

impl VariationDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, replacing the value of an existing key in place.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<VariationValue>,
        source: impl Into<String>,
    ) {
        let key = key.into();
        let value = value.into();
        let source = source.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.value = value;
                entry.source = source;
            }
            None => self.entries.push(Entry { key, value, source }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&VariationValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Source (file path or `inline`) that contributed `key`.
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.source.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at a zero-based position.
    pub fn get_index(&self, index: usize) -> Option<(&str, &VariationValue)> {
        self.entries
            .get(index)
            .map(|e| (e.key.as_str(), &e.value))
    }

    /// Position of `key`, if present.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariationValue)> {
        self.entries.iter().map(|e| (e.key.as_str(), &e.value))
    }
}

impl<K, V> FromIterator<(K, V)> for VariationDictionary
where
    K: Into<String>,
    V: Into<VariationValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = VariationDictionary::new();
        for (key, value) in iter {
            dict.insert(key, value, "inline");
        }
        dict
    }
}
