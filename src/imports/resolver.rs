//! Loading and merging declared imports.

use super::resolved::{ChunkEntry, ResolvedImport, ResolvedImports};
use super::spec::{ImportMap, ImportSpec};
use super::style::{StyleOptions, resolve_style_source};
use crate::document::DocumentKind;
use crate::error::{PromptError, Result};
use crate::inheritance::{ImportLayer, resolve_chunk};
use crate::variations::{VariationDictionary, VariationValue, load_variations};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix of keys generated for inline literal values.
pub const INLINE_KEY_PREFIX: &str = "inline_";

/// Stable key for an inline literal, derived from its content.
///
/// The same text always maps to the same key, across runs and files.
pub fn inline_key(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{}{}", INLINE_KEY_PREFIX, &hex::encode(digest)[..16])
}

/// Resolve one import table relative to `base_path`.
pub fn resolve_imports(imports: &ImportMap, base_path: &Path) -> Result<ResolvedImports> {
    ImportResolver::new().resolve(imports, base_path)
}

/// How a string import was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    File(PathBuf),
    Inline(String),
}

/// Loads variation files and chunks named by import tables.
#[derive(Debug, Default)]
pub struct ImportResolver {
    style: StyleOptions,
    /// Chunk files on the current loading path, for cycle detection.
    loading: Vec<PathBuf>,
}

impl ImportResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply style/theme overrides to every variation file import.
    pub fn with_style(style: StyleOptions) -> Self {
        Self {
            style,
            loading: Vec::new(),
        }
    }

    /// Resolve an import table. Relative paths are joined to `base_path`.
    pub fn resolve(&mut self, imports: &ImportMap, base_path: &Path) -> Result<ResolvedImports> {
        self.resolve_filtered(imports, base_path, &BTreeSet::new())
    }

    /// Resolve the layers of an inheritance chain, root first.
    ///
    /// Later layers replace earlier ones by name; names a later layer
    /// redefines or removes are never loaded from the earlier layer.
    pub fn resolve_layers(&mut self, layers: &[ImportLayer]) -> Result<ResolvedImports> {
        let mut resolved = ResolvedImports::new();
        for (i, layer) in layers.iter().enumerate() {
            let shadowed: BTreeSet<String> = layers[i + 1..]
                .iter()
                .flat_map(|later| {
                    later
                        .imports
                        .specs()
                        .map(|(n, _)| n.to_string())
                        .chain(later.imports.removed().map(str::to_string))
                        .collect::<Vec<_>>()
                })
                .collect();
            let level = self.resolve_filtered(&layer.imports, &layer.base_dir, &shadowed)?;
            resolved.overlay(level);
        }
        Ok(resolved)
    }

    fn resolve_filtered(
        &mut self,
        imports: &ImportMap,
        base_path: &Path,
        skip: &BTreeSet<String>,
    ) -> Result<ResolvedImports> {
        let mut resolved = ResolvedImports::new();
        for (name, spec) in imports.specs() {
            if skip.contains(name) {
                continue;
            }
            let import = self.resolve_spec(name, spec, base_path)?;
            resolved.insert(name, import);
        }
        for name in imports.removed() {
            resolved.remove(name);
        }
        Ok(resolved)
    }

    fn resolve_spec(
        &mut self,
        name: &str,
        spec: &ImportSpec,
        base_path: &Path,
    ) -> Result<ResolvedImport> {
        match spec {
            ImportSpec::Source(source) => match classify(name, source, base_path)? {
                Source::File(path) if is_chunk_file(&path) => {
                    let entry = self.load_chunk_entry(&path)?;
                    Ok(ResolvedImport::Chunk(Box::new(entry)))
                }
                Source::File(path) => {
                    let path = self.styled(name, &path);
                    let dict = load_variations(&path)?;
                    debug!(placeholder = name, path = %path.display(), entries = dict.len(), "loaded variations");
                    Ok(ResolvedImport::Variations(dict))
                }
                Source::Inline(text) => {
                    let mut dict = VariationDictionary::new();
                    dict.insert(inline_key(&text), text.clone(), inline_source(&text));
                    Ok(ResolvedImport::Variations(dict))
                }
            },
            ImportSpec::List(items) => self
                .merge_list(name, items, base_path)
                .map(ResolvedImport::Variations),
            ImportSpec::Group(group) => {
                let resolved = self.resolve(group, base_path)?;
                Ok(ResolvedImport::Group(resolved))
            }
        }
    }

    /// Merge list entries in declaration order, rejecting key collisions.
    fn merge_list(
        &mut self,
        name: &str,
        items: &[String],
        base_path: &Path,
    ) -> Result<VariationDictionary> {
        let mut merged = VariationDictionary::new();

        for item in items {
            match classify(name, item, base_path)? {
                Source::File(path) => {
                    if is_chunk_file(&path) {
                        return Err(PromptError::MalformedDocument {
                            document: path.display().to_string(),
                            message: format!(
                                "chunk files cannot be merged into the variation list for '{}'",
                                name
                            ),
                            hint: Some("import the chunk under its own name".to_string()),
                        });
                    }
                    let path = self.styled(name, &path);
                    let source = path.display().to_string();
                    let dict = load_variations(&path)?;
                    for (key, value) in dict.iter() {
                        if let Some(existing) = merged.source_of(key) {
                            return Err(PromptError::DuplicateImportKey {
                                placeholder: name.to_string(),
                                key: key.to_string(),
                                first_source: existing.to_string(),
                                second_source: source,
                            });
                        }
                        merged.insert(key, value.clone(), source.as_str());
                    }
                }
                Source::Inline(text) => {
                    let key = inline_key(&text);
                    if let Some(existing) = merged.source_of(&key) {
                        if merged.get(&key) == Some(&VariationValue::Scalar(text.clone())) {
                            warn!(placeholder = name, literal = %text, "duplicate inline value ignored");
                            continue;
                        }
                        return Err(PromptError::DuplicateImportKey {
                            placeholder: name.to_string(),
                            key,
                            first_source: existing.to_string(),
                            second_source: inline_source(&text),
                        });
                    }
                    merged.insert(key, text.clone(), inline_source(&text));
                }
            }
        }

        debug!(placeholder = name, sources = items.len(), entries = merged.len(), "merged variation list");
        Ok(merged)
    }

    fn styled(&self, name: &str, path: &Path) -> PathBuf {
        if self.style.is_active() {
            resolve_style_source(name, path, &self.style).path
        } else {
            path.to_path_buf()
        }
    }

    fn load_chunk_entry(&mut self, path: &Path) -> Result<ChunkEntry> {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.loading.contains(&key) {
            let mut chain: Vec<String> = self.loading.iter().map(|p| p.display().to_string()).collect();
            chain.push(key.display().to_string());
            return Err(PromptError::CyclicChunkReference { chain });
        }

        self.loading.push(key);
        let entry = self.load_chunk_layers(path);
        self.loading.pop();
        entry
    }

    fn load_chunk_layers(&mut self, path: &Path) -> Result<ChunkEntry> {
        let merged = resolve_chunk(path)?;
        let imports = self.resolve_layers(&merged.import_layers)?;
        let chunks = self.resolve_layers(&merged.chunk_layers)?;
        debug!(chunk = %path.display(), imports = imports.len(), "loaded chunk");
        Ok(ChunkEntry {
            document: merged.document,
            imports,
            chunks,
        })
    }
}

/// A string names a file when it points at an existing file; strings that
/// look like YAML paths must exist. Everything else is an inline literal.
fn classify(placeholder: &str, source: &str, base_path: &Path) -> Result<Source> {
    let trimmed = source.trim();
    let candidate = base_path.join(trimmed);
    if !trimmed.is_empty() && candidate.is_file() {
        return Ok(Source::File(candidate));
    }
    if is_yaml_path(trimmed) {
        return Err(PromptError::ImportNotFound {
            placeholder: placeholder.to_string(),
            path: candidate.display().to_string(),
        });
    }
    Ok(Source::Inline(source.to_string()))
}

fn is_yaml_path(source: &str) -> bool {
    !source.contains(char::is_whitespace) && (source.ends_with(".yaml") || source.ends_with(".yml"))
}

fn is_chunk_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(DocumentKind::from_file_name)
        == Some(DocumentKind::Chunk)
}

fn inline_source(text: &str) -> String {
    format!("inline \"{}\"", text)
}
