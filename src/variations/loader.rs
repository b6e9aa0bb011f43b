//! Loading variation dictionaries from YAML.

use super::dictionary::{VariationDictionary, VariationValue};
use crate::document::load_yaml;
use crate::error::{PromptError, Result};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Load a variation file from disk.
///
/// The file's top level must be a mapping. Key order is preserved.
pub fn load_variations<P: AsRef<Path>>(path: P) -> Result<VariationDictionary> {
    let path = path.as_ref();
    let value = load_yaml(path)?;
    variations_from_yaml(&value, &path.display().to_string())
}

/// Convert an already-parsed YAML value into a variation dictionary.
///
/// `source_name` is recorded on every entry and used in error messages.
pub fn variations_from_yaml(value: &Value, source_name: &str) -> Result<VariationDictionary> {
    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(VariationDictionary::new()),
        other => {
            return Err(PromptError::MalformedDocument {
                document: source_name.to_string(),
                message: format!(
                    "variation files must contain a mapping at the top level, found {}",
                    describe(other)
                ),
                hint: Some("write one `key: value` line per variation".to_string()),
            });
        }
    };

    let mut dict = VariationDictionary::new();
    for (key, entry) in mapping {
        let key = scalar_text(key).ok_or_else(|| PromptError::MultiPartShape {
            source_name: source_name.to_string(),
            key: format!("{:?}", key),
            message: "variation keys must be scalars".to_string(),
        })?;
        let value = entry_value(&key, entry, source_name)?;
        dict.insert(key, value, source_name);
    }
    Ok(dict)
}

fn entry_value(key: &str, entry: &Value, source_name: &str) -> Result<VariationValue> {
    if let Some(text) = scalar_text(entry) {
        return Ok(VariationValue::Scalar(text));
    }

    let Value::Mapping(parts) = entry else {
        return Err(PromptError::MultiPartShape {
            source_name: source_name.to_string(),
            key: key.to_string(),
            message: format!("expected a string or a mapping of parts, found {}", describe(entry)),
        });
    };

    let mut resolved = BTreeMap::new();
    for (part_name, part_value) in parts {
        let part_name = scalar_text(part_name).unwrap_or_default();
        let text = scalar_text(part_value).ok_or_else(|| PromptError::MultiPartShape {
            source_name: source_name.to_string(),
            key: key.to_string(),
            message: format!(
                "part '{}' must be a string, found {}",
                part_name,
                describe(part_value)
            ),
        })?;
        resolved.insert(part_name, text);
    }
    Ok(VariationValue::Parts(resolved))
}

/// Text of a YAML scalar; `None` for sequences, mappings and tagged values.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
