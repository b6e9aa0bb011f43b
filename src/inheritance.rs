//! `implements:` chain resolution.
//!
//! Templates wrap templates, prompts implement a template, and chunks extend
//! chunks. Chains are loaded child-first, checked for cycles, then folded
//! root-first so that every child overrides its parent.
//!
//! Imports are not merged here: each level keeps its own [`ImportLayer`]
//! because relative paths resolve against the directory of the document that
//! declared them.

use crate::document::types::{NEGPROMPT_TOKEN, PROMPT_TOKEN};
use crate::document::{
    ChunkDocument, GenerationSpec, Parameters, PromptDocument, TemplateDocument, load_chunk,
    load_template,
};
use crate::error::{PromptError, Result};
use crate::imports::ImportMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Imports declared by one document of a chain.
#[derive(Debug, Clone)]
pub struct ImportLayer {
    pub imports: ImportMap,
    /// Directory relative import paths resolve against.
    pub base_dir: PathBuf,
}

impl ImportLayer {
    fn new(imports: &ImportMap, document_path: &Path) -> Self {
        Self {
            imports: imports.clone(),
            base_dir: parent_dir(document_path),
        }
    }
}

/// A template after folding its whole `implements:` chain.
#[derive(Debug, Clone)]
pub struct MergedTemplate {
    pub name: String,
    /// Text with a single remaining `{prompt}` slot.
    pub template: String,
    pub negative_prompt: String,
    pub parameters: Parameters,
    /// Root first.
    pub import_layers: Vec<ImportLayer>,
    /// Files of the chain, root first.
    pub chain: Vec<PathBuf>,
}

/// A prompt merged into its template.
#[derive(Debug, Clone)]
pub struct MergedPrompt {
    pub name: String,
    pub template: String,
    pub negative_prompt: String,
    pub parameters: Parameters,
    pub generation: GenerationSpec,
    /// Template layers root first, the prompt's own layer last.
    pub import_layers: Vec<ImportLayer>,
    pub chain: Vec<PathBuf>,
}

/// A chunk after folding its `implements:` chain.
#[derive(Debug, Clone)]
pub struct MergedChunk {
    pub document: ChunkDocument,
    pub import_layers: Vec<ImportLayer>,
    /// Layers of nested chunk overrides (`chunks:`), root first.
    pub chunk_layers: Vec<ImportLayer>,
}

/// Load a template file and fold its parents into it.
pub fn resolve_template<P: AsRef<Path>>(path: P) -> Result<MergedTemplate> {
    let docs = load_chain(path.as_ref(), |p: &Path| load_template(p), |doc: &TemplateDocument| {
        doc.implements.clone()
    })?;
    Ok(fold_templates(docs))
}

/// Resolve a prompt document against the template it implements.
pub fn resolve_prompt(prompt: &PromptDocument) -> Result<MergedPrompt> {
    let template_path = parent_dir(&prompt.path).join(&prompt.implements);
    let template = resolve_template(&template_path)?;
    debug!(
        prompt = %prompt.path.display(),
        chain_len = template.chain.len(),
        "resolved template chain"
    );

    let text = template.template.replace(PROMPT_TOKEN, &prompt.prompt);

    let negative_prompt = if template.negative_prompt.contains(NEGPROMPT_TOKEN) {
        template
            .negative_prompt
            .replace(NEGPROMPT_TOKEN, prompt.negative_prompt.as_deref().unwrap_or(""))
    } else {
        match &prompt.negative_prompt {
            Some(negative) => negative.clone(),
            None => template.negative_prompt.clone(),
        }
    };

    let mut parameters = template.parameters.clone();
    parameters.extend(prompt.parameters.clone());

    let mut import_layers = template.import_layers.clone();
    import_layers.push(ImportLayer::new(&prompt.imports, &prompt.path));

    let mut chain = template.chain.clone();
    chain.push(prompt.path.clone());

    let name = if prompt.name.is_empty() {
        template.name.clone()
    } else {
        prompt.name.clone()
    };

    Ok(MergedPrompt {
        name,
        template: text,
        negative_prompt,
        parameters,
        generation: prompt.generation.clone(),
        import_layers,
        chain,
    })
}

/// Load a chunk file and fold its parents into it.
pub fn resolve_chunk<P: AsRef<Path>>(path: P) -> Result<MergedChunk> {
    let docs = load_chain(path.as_ref(), |p: &Path| load_chunk(p), |doc: &ChunkDocument| {
        doc.implements.clone()
    })?;

    let mut import_layers = Vec::with_capacity(docs.len());
    let mut chunk_layers = Vec::with_capacity(docs.len());
    let mut merged: Option<ChunkDocument> = None;

    for doc in docs {
        import_layers.push(ImportLayer::new(&doc.imports, &doc.path));
        chunk_layers.push(ImportLayer::new(&doc.chunks, &doc.path));
        merged = Some(match merged {
            None => doc,
            Some(parent) => merge_chunk(parent, doc),
        });
    }

    let document = merged.ok_or_else(|| {
        PromptError::malformed(path.as_ref().display().to_string(), "empty chunk chain")
    })?;

    if document.template.is_empty() {
        return Err(PromptError::malformed(
            document.path.display().to_string(),
            "no 'template' in the chunk or any chunk it implements",
        ));
    }

    Ok(MergedChunk {
        document,
        import_layers,
        chunk_layers,
    })
}

fn merge_chunk(parent: ChunkDocument, child: ChunkDocument) -> ChunkDocument {
    let mut defaults = parent.defaults;
    defaults.extend(child.defaults);
    ChunkDocument {
        version: child.version,
        chunk_type: if child.chunk_type.is_empty() {
            parent.chunk_type
        } else {
            child.chunk_type
        },
        template: if child.template.is_empty() {
            parent.template
        } else {
            child.template
        },
        implements: child.implements,
        imports: parent.imports.merged_with(&child.imports),
        defaults,
        chunks: parent.chunks.merged_with(&child.chunks),
        path: child.path,
    }
}

fn fold_templates(docs: Vec<TemplateDocument>) -> MergedTemplate {
    let mut merged: Option<MergedTemplate> = None;

    for doc in docs {
        let layer = ImportLayer::new(&doc.imports, &doc.path);
        merged = Some(match merged {
            None => MergedTemplate {
                name: doc.name.clone(),
                template: doc.template.clone(),
                negative_prompt: doc.negative_prompt.clone(),
                parameters: doc.parameters.clone(),
                import_layers: vec![layer],
                chain: vec![doc.path.clone()],
            },
            Some(mut parent) => {
                parent.template = parent.template.replace(PROMPT_TOKEN, &doc.template);
                if !doc.negative_prompt.is_empty() {
                    parent.negative_prompt = if parent.negative_prompt.contains(NEGPROMPT_TOKEN) {
                        parent
                            .negative_prompt
                            .replace(NEGPROMPT_TOKEN, &doc.negative_prompt)
                    } else {
                        doc.negative_prompt.clone()
                    };
                }
                parent.parameters.extend(doc.parameters.clone());
                parent.import_layers.push(layer);
                parent.chain.push(doc.path.clone());
                if !doc.name.is_empty() {
                    parent.name = doc.name.clone();
                }
                parent
            }
        });
    }

    merged.unwrap_or_else(|| MergedTemplate {
        name: String::new(),
        template: PROMPT_TOKEN.to_string(),
        negative_prompt: String::new(),
        parameters: Parameters::new(),
        import_layers: Vec::new(),
        chain: Vec::new(),
    })
}

/// Load `path` and every document it implements, returned root first.
fn load_chain<T>(
    path: &Path,
    load: impl Fn(&Path) -> Result<T>,
    parent_of: impl Fn(&T) -> Option<String>,
) -> Result<Vec<T>> {
    let mut docs = Vec::new();
    let mut visited: Vec<PathBuf> = Vec::new();
    let mut current = Some(path.to_path_buf());

    while let Some(path) = current.take() {
        let key = canonical(&path);
        if visited.contains(&key) {
            let mut chain: Vec<String> = visited.iter().map(|p| p.display().to_string()).collect();
            chain.push(key.display().to_string());
            return Err(PromptError::CyclicInheritance { chain });
        }
        visited.push(key);

        let doc = load(&path)?;
        current = parent_of(&doc).map(|parent| parent_dir(&path).join(parent));
        docs.push(doc);
    }

    docs.reverse();
    Ok(docs)
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
