//! Import specifications as declared in documents.

use crate::variations::{describe, scalar_text};
use serde::Deserialize;
use serde_yaml::Value;

/// One declared import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSpec {
    /// A file path or an inline literal; classified at resolve time.
    Source(String),
    /// Several sources merged in declaration order.
    List(Vec<String>),
    /// Nested placeholder group (e.g. `chunks.positive`).
    Group(ImportMap),
}

/// Ordered `placeholder -> import` table.
///
/// An entry with no spec (`Name: null` in YAML) explicitly removes the
/// placeholder, including any import inherited from a parent document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct ImportMap {
    entries: Vec<(String, Option<ImportSpec>)>,
}

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: Option<ImportSpec>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = spec,
            None => self.entries.push((name, spec)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Option<ImportSpec>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Declared imports, skipping removals.
    pub fn specs(&self) -> impl Iterator<Item = (&str, &ImportSpec)> {
        self.entries
            .iter()
            .filter_map(|(n, s)| s.as_ref().map(|s| (n.as_str(), s)))
    }

    /// Placeholders explicitly removed with `null`.
    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, s)| s.is_none())
            .map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `child` on top of `self`; child entries win by name.
    pub fn merged_with(&self, child: &ImportMap) -> ImportMap {
        let mut merged = self.clone();
        for (name, spec) in &child.entries {
            merged.insert(name.clone(), spec.clone());
        }
        merged
    }
}

impl TryFrom<Value> for ImportMap {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        parse_import_map(&value, "imports")
    }
}

fn parse_import_map(value: &Value, path: &str) -> Result<ImportMap, String> {
    let mapping = match value {
        Value::Null => return Ok(ImportMap::new()),
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(format!(
                "'{}' must be a mapping of placeholder names to sources, found {}",
                path,
                describe(other)
            ));
        }
    };

    let mut map = ImportMap::new();
    for (key, entry) in mapping {
        let Some(name) = scalar_text(key).filter(|n| !n.is_empty()) else {
            return Err(format!("'{}' contains an empty or non-scalar key", path));
        };
        let entry_path = format!("{}.{}", path, name);
        let spec = match entry {
            Value::Null => None,
            Value::Sequence(items) => {
                let mut sources = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Mapping(_) | Value::Sequence(_) | Value::Null => {
                            return Err(format!(
                                "'{}' list entries must be strings, found {}",
                                entry_path,
                                describe(item)
                            ));
                        }
                        _ => sources.push(scalar_text(item).unwrap_or_default()),
                    }
                }
                Some(ImportSpec::List(sources))
            }
            Value::Mapping(_) => Some(ImportSpec::Group(parse_import_map(entry, &entry_path)?)),
            Value::Tagged(_) => {
                return Err(format!("'{}' uses an unsupported YAML tag", entry_path));
            }
            scalar => Some(ImportSpec::Source(scalar_text(scalar).unwrap_or_default())),
        };
        map.insert(name, spec);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<ImportMap, String> {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        ImportMap::try_from(value)
    }

    #[test]
    fn test_parses_every_import_form() {
        let yaml = r#"
Hair: variations/hair.yaml
Place:
  - variations/city.yaml
  - a quiet beach at dusk
chunks:
  positive: chunks/positive.chunk.yaml
  negative: chunks/negative.chunk.yaml
Outfit: ~
"#;
        let map = parse(yaml).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(
            map.get("Hair"),
            Some(&Some(ImportSpec::Source("variations/hair.yaml".to_string())))
        );
        match map.get("Place") {
            Some(Some(ImportSpec::List(items))) => assert_eq!(items.len(), 2),
            other => panic!("unexpected: {:?}", other),
        }
        match map.get("chunks") {
            Some(Some(ImportSpec::Group(group))) => {
                let names: Vec<&str> = group.specs().map(|(n, _)| n).collect();
                assert_eq!(names, vec!["positive", "negative"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(map.removed().collect::<Vec<_>>(), vec!["Outfit"]);
    }

    #[test]
    fn test_rejects_non_mapping() {
        let err = parse("- a\n- b\n").unwrap_err();
        assert!(err.contains("must be a mapping"));
    }

    #[test]
    fn test_rejects_nested_list_entries() {
        let err = parse("Place:\n  - [a, b]\n").unwrap_err();
        assert!(err.contains("imports.Place"));
    }

    #[test]
    fn test_merge_child_wins_and_keeps_parent_order() {
        let parent = parse("A: a.yaml\nB: b.yaml\n").unwrap();
        let child = parse("B: other.yaml\nC: c.yaml\nA: ~\n").unwrap();
        let merged = parent.merged_with(&child);

        let names: Vec<&str> = merged.specs().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["B", "C"]);
        assert_eq!(
            merged.get("B"),
            Some(&Some(ImportSpec::Source("other.yaml".to_string())))
        );
        assert_eq!(merged.removed().collect::<Vec<_>>(), vec!["A"]);
    }
}
