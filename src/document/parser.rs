//! Turning YAML values into typed documents.

use super::loader::load_yaml;
use super::model::{ChunkDocument, Document, DocumentKind, PromptDocument, TemplateDocument};
use super::types::{LORAS_TOKEN, NEGPROMPT_TOKEN, PROMPT_TOKEN};
use crate::error::{PromptError, Result};
use crate::variations::{describe, variations_from_yaml};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::path::Path;

const STRING_FIELD_HINT: &str = "YAML reads text starting with '{' or containing ': ' as a mapping; wrap the value in quotes";

/// Load any document kind from disk.
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let value = load_yaml(path)?;
    parse_document(&value, path)
}

/// Load a file that must be a template document.
pub fn load_template<P: AsRef<Path>>(path: P) -> Result<TemplateDocument> {
    match load_document(&path)? {
        Document::Template(doc) => Ok(doc),
        other => Err(kind_mismatch(path.as_ref(), DocumentKind::Template, other.kind())),
    }
}

/// Load a file that must be a chunk document.
pub fn load_chunk<P: AsRef<Path>>(path: P) -> Result<ChunkDocument> {
    let path = path.as_ref();
    let value = load_yaml(path)?;
    match parse_as(DocumentKind::Chunk, &value, path)? {
        Document::Chunk(doc) => Ok(doc),
        other => Err(kind_mismatch(path, DocumentKind::Chunk, other.kind())),
    }
}

/// Load a file that must be a prompt document.
pub fn load_prompt<P: AsRef<Path>>(path: P) -> Result<PromptDocument> {
    match load_document(&path)? {
        Document::Prompt(doc) => Ok(doc),
        other => Err(kind_mismatch(path.as_ref(), DocumentKind::Prompt, other.kind())),
    }
}

/// Parse a YAML value into a typed document.
///
/// The kind comes from the file name suffix when it has one
/// (`.template.yaml`, `.chunk.yaml`, `.prompt.yaml`), else from the fields
/// present. Mappings without any document field are variation dictionaries.
pub fn parse_document(value: &Value, path: &Path) -> Result<Document> {
    let kind = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(DocumentKind::from_file_name)
        .unwrap_or_else(|| sniff_kind(value));
    parse_as(kind, value, path)
}

/// Parse a YAML value as a specific document kind.
pub fn parse_as(kind: DocumentKind, value: &Value, path: &Path) -> Result<Document> {
    let name = path.display().to_string();
    if kind == DocumentKind::Variations {
        return variations_from_yaml(value, &name).map(Document::Variations);
    }

    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(PromptError::malformed(
                &name,
                format!(
                    "{} documents must be a mapping, found {}",
                    kind.as_str(),
                    describe(other)
                ),
            ));
        }
    };

    match kind {
        DocumentKind::Template => parse_template(mapping, value, path).map(Document::Template),
        DocumentKind::Chunk => parse_chunk(mapping, value, path).map(Document::Chunk),
        DocumentKind::Prompt => parse_prompt(mapping, value, path).map(Document::Prompt),
        DocumentKind::Variations => unreachable!("handled above"),
    }
}

fn sniff_kind(value: &Value) -> DocumentKind {
    let Value::Mapping(mapping) = value else {
        return DocumentKind::Variations;
    };
    if has_key(mapping, "generation") || has_key(mapping, "prompt") {
        DocumentKind::Prompt
    } else if has_key(mapping, "type") && has_key(mapping, "template") {
        DocumentKind::Chunk
    } else if has_key(mapping, "template") {
        DocumentKind::Template
    } else {
        DocumentKind::Variations
    }
}

fn parse_template(mapping: &Mapping, value: &Value, path: &Path) -> Result<TemplateDocument> {
    let name = path.display().to_string();
    check_string_fields(mapping, &name, &["name", "template", "implements", "negative_prompt"])?;
    require_field(mapping, &name, "template")?;

    let mut doc: TemplateDocument = deserialize(value, &name)?;
    doc.path = path.to_path_buf();

    if !doc.template.contains(PROMPT_TOKEN) {
        return Err(PromptError::ReservedPlaceholder {
            document: name,
            message: format!(
                "templates must contain the {} token; a template wraps a prompt and is never a prompt itself",
                PROMPT_TOKEN
            ),
        });
    }
    Ok(doc)
}

fn parse_chunk(mapping: &Mapping, value: &Value, path: &Path) -> Result<ChunkDocument> {
    let name = path.display().to_string();
    check_string_fields(mapping, &name, &["type", "template", "implements"])?;

    let mut doc: ChunkDocument = deserialize(value, &name)?;
    doc.path = path.to_path_buf();

    if doc.template.is_empty() && doc.implements.is_none() {
        return Err(PromptError::malformed(&name, "missing required field 'template'"));
    }
    for token in [PROMPT_TOKEN, NEGPROMPT_TOKEN, LORAS_TOKEN] {
        if doc.template.contains(token) {
            return Err(PromptError::ReservedPlaceholder {
                document: name,
                message: format!(
                    "chunks cannot use the reserved token {}; chunks are fragments, not complete prompts",
                    token
                ),
            });
        }
    }
    Ok(doc)
}

fn parse_prompt(mapping: &Mapping, value: &Value, path: &Path) -> Result<PromptDocument> {
    let name = path.display().to_string();

    if has_key(mapping, "template") {
        return Err(PromptError::ReservedPlaceholder {
            document: name,
            message: "prompt documents put their text under 'prompt:', not 'template:'".to_string(),
        });
    }
    if has_key(mapping, "variations") {
        return Err(PromptError::ReservedPlaceholder {
            document: name,
            message: "'variations:' is not a prompt field; declare placeholder sources under 'imports:'"
                .to_string(),
        });
    }

    check_string_fields(mapping, &name, &["name", "prompt", "implements", "negative_prompt"])?;
    require_field(mapping, &name, "implements")?;
    require_field(mapping, &name, "prompt")?;

    let mut doc: PromptDocument = deserialize(value, &name)?;
    doc.path = path.to_path_buf();
    Ok(doc)
}

fn deserialize<T: DeserializeOwned>(value: &Value, name: &str) -> Result<T> {
    serde_yaml::from_value(value.clone()).map_err(|e| PromptError::malformed(name, e.to_string()))
}

fn has_key(mapping: &Mapping, key: &str) -> bool {
    mapping.contains_key(Value::String(key.to_string()))
}

fn require_field(mapping: &Mapping, name: &str, field: &str) -> Result<()> {
    if has_key(mapping, field) {
        Ok(())
    } else {
        Err(PromptError::malformed(
            name,
            format!("missing required field '{}'", field),
        ))
    }
}

/// Reject mappings or lists where text is expected, with a quoting hint.
fn check_string_fields(mapping: &Mapping, name: &str, fields: &[&str]) -> Result<()> {
    for field in fields {
        if let Some(value) = mapping.get(Value::String(field.to_string())) {
            if matches!(value, Value::Mapping(_) | Value::Sequence(_)) {
                return Err(PromptError::MalformedDocument {
                    document: name.to_string(),
                    message: format!("'{}' must be a string, found {}", field, describe(value)),
                    hint: Some(STRING_FIELD_HINT.to_string()),
                });
            }
        }
    }
    Ok(())
}

fn kind_mismatch(path: &Path, expected: DocumentKind, found: DocumentKind) -> PromptError {
    PromptError::malformed(
        path.display().to_string(),
        format!(
            "expected a {} document, found a {} document",
            expected.as_str(),
            found.as_str()
        ),
    )
}
