//! Typed document structs.

use super::types::{GenerationSpec, default_version, scalar_map, scalar_string};
use crate::imports::ImportMap;
use crate::variations::VariationDictionary;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Free-form document parameters (sampler, steps, cfg scale, ...).
pub type Parameters = BTreeMap<String, serde_yaml::Value>;

/// A wrapper template. Its text must contain `{prompt}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDocument {
    #[serde(default = "default_version", deserialize_with = "scalar_string")]
    pub version: String,

    #[serde(default)]
    pub name: String,

    pub template: String,

    /// Parent template this one wraps into.
    #[serde(default)]
    pub implements: Option<String>,

    #[serde(default)]
    pub parameters: Parameters,

    #[serde(default)]
    pub imports: ImportMap,

    #[serde(default)]
    pub negative_prompt: String,

    /// File the document was loaded from.
    #[serde(skip)]
    pub path: PathBuf,
}

/// A reusable template fragment, injected with `@Name`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkDocument {
    #[serde(default = "default_version", deserialize_with = "scalar_string")]
    pub version: String,

    /// Free-form category tag (`character`, `scene`, ...).
    #[serde(rename = "type", default)]
    pub chunk_type: String,

    /// May be empty only when inherited through `implements`.
    #[serde(default)]
    pub template: String,

    #[serde(default)]
    pub implements: Option<String>,

    #[serde(default)]
    pub imports: ImportMap,

    /// Literal values for the chunk's own placeholders.
    #[serde(default, deserialize_with = "scalar_map")]
    pub defaults: BTreeMap<String, String>,

    /// Overrides for chunks referenced from inside this chunk.
    #[serde(default)]
    pub chunks: ImportMap,

    #[serde(skip)]
    pub path: PathBuf,
}

/// A leaf prompt. Always implements a template.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptDocument {
    #[serde(default = "default_version", deserialize_with = "scalar_string")]
    pub version: String,

    #[serde(default)]
    pub name: String,

    pub implements: String,

    #[serde(default)]
    pub generation: GenerationSpec,

    pub prompt: String,

    #[serde(default)]
    pub imports: ImportMap,

    /// Injected at the template's `{negprompt}`, or replaces its negative text.
    #[serde(default)]
    pub negative_prompt: Option<String>,

    /// Overrides for the template's parameters.
    #[serde(default)]
    pub parameters: Parameters,

    #[serde(skip)]
    pub path: PathBuf,
}

/// Any parsed document.
#[derive(Debug, Clone)]
pub enum Document {
    Template(TemplateDocument),
    Chunk(ChunkDocument),
    Prompt(PromptDocument),
    Variations(VariationDictionary),
}

impl Document {
    /// Short kind label used in diagnostics.
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Template(_) => DocumentKind::Template,
            Document::Chunk(_) => DocumentKind::Chunk,
            Document::Prompt(_) => DocumentKind::Prompt,
            Document::Variations(_) => DocumentKind::Variations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Template,
    Chunk,
    Prompt,
    Variations,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Template => "template",
            DocumentKind::Chunk => "chunk",
            DocumentKind::Prompt => "prompt",
            DocumentKind::Variations => "variations",
        }
    }

    /// Kind implied by a `*.template.yaml` / `*.chunk.yaml` / `*.prompt.yaml` name.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = file_name
            .strip_suffix(".yaml")
            .or_else(|| file_name.strip_suffix(".yml"))?;
        if stem.ends_with(".template") {
            Some(DocumentKind::Template)
        } else if stem.ends_with(".chunk") {
            Some(DocumentKind::Chunk)
        } else if stem.ends_with(".prompt") {
            Some(DocumentKind::Prompt)
        } else {
            None
        }
    }
}
