//! End-to-end prompt file processing.
//!
//! load -> `implements:` chain -> per-level imports -> chunk expansion ->
//! generation. Everything that touches the filesystem happens in
//! [`Pipeline::from_prompt_file`]; generation itself is pure.

use crate::document::types::RESERVED_NAMES;
use crate::document::{GenerationSpec, PromptDocument, load_prompt};
use crate::error::Result;
use crate::generator::{GeneratedPrompt, GeneratorOptions, PromptGenerator};
use crate::imports::{ImportResolver, StyleOptions};
use crate::inheritance::{MergedPrompt, resolve_prompt};
use crate::resolver::{ResolvedContext, expand_chunks, scan_tokens};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Seed for every random choice made while resolving and generating.
    pub rng_seed: Option<u64>,
    /// Overrides the document's `generation.max_images`.
    pub max_images: Option<u64>,
    pub normalize: bool,
    pub style: StyleOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            rng_seed: None,
            max_images: None,
            normalize: true,
            style: StyleOptions::default(),
        }
    }
}

/// A prompt document resolved up to (not including) generation.
#[derive(Debug, Clone)]
pub struct Pipeline {
    merged: MergedPrompt,
    /// Template after chunk expansion.
    template: String,
    negative_prompt: String,
    ctx: ResolvedContext,
    generation: GenerationSpec,
    options: PipelineOptions,
}

impl Pipeline {
    /// Load a prompt file and resolve everything generation needs.
    pub fn from_prompt_file<P: AsRef<Path>>(path: P, options: PipelineOptions) -> Result<Self> {
        let document = load_prompt(path.as_ref())?;
        Self::from_prompt(&document, options)
    }

    pub fn from_prompt(document: &PromptDocument, options: PipelineOptions) -> Result<Self> {
        let merged = resolve_prompt(document)?;

        let mut resolver = ImportResolver::with_style(options.style.clone());
        let imports = resolver.resolve_layers(&merged.import_layers)?;
        let mut ctx = ResolvedContext::new(imports).with_parameters(merged.parameters.clone());
        debug!(
            imports = ctx.imports.len(),
            removed = ctx.removed.len(),
            "resolved imports"
        );

        let mut rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let template = expand_chunks(&merged.template, &ctx, &mut rng)?;
        let negative = expand_chunks(&merged.negative_prompt, &ctx, &mut rng)?;
        for expansion in [&template, &negative] {
            let added = ctx.imports.absorb_missing_variations(&expansion.imports);
            if !added.is_empty() {
                debug!(names = ?added, "imports contributed by chunks");
            }
        }

        let mut generation = merged.generation.clone();
        if let Some(max_images) = options.max_images {
            generation.max_images = max_images;
        }

        info!(name = %merged.name, chain = merged.chain.len(), "prompt resolved");
        Ok(Self {
            template: template.text,
            negative_prompt: negative.text,
            merged,
            ctx,
            generation,
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.merged.name
    }

    /// Prompt text with chunks expanded and placeholders intact.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn negative_prompt(&self) -> &str {
        &self.negative_prompt
    }

    pub fn context(&self) -> &ResolvedContext {
        &self.ctx
    }

    /// Generation settings after option overrides.
    pub fn generation(&self) -> &GenerationSpec {
        &self.generation
    }

    /// Files of the `implements:` chain, root first.
    pub fn chain(&self) -> &[PathBuf] {
        &self.merged.chain
    }

    /// Distinct placeholder names in the expanded texts, reserved names
    /// excluded, in order of first appearance.
    pub fn placeholders(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for text in [&self.template, &self.negative_prompt] {
            for token in scan_tokens(text)? {
                if !RESERVED_NAMES.contains(&token.name.as_str()) && !names.contains(&token.name) {
                    names.push(token.name);
                }
            }
        }
        Ok(names)
    }

    /// Start the lazy prompt sequence.
    pub fn generate(&self) -> Result<PromptGenerator> {
        let options = GeneratorOptions {
            rng_seed: self.options.rng_seed,
            normalize: self.options.normalize,
        };
        PromptGenerator::new(
            &self.template,
            &self.negative_prompt,
            self.ctx.clone(),
            self.generation.clone(),
            &options,
        )
    }

    /// Generate every prompt eagerly.
    pub fn collect(&self) -> Result<Vec<GeneratedPrompt>> {
        self.generate()?.collect()
    }
}
