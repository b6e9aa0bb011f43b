//! Implementation of the `promptgen check` command.
//!
//! Parses a document and reports what it contains. Prompt documents are
//! resolved through inheritance, imports and chunks, so every error short
//! of generation itself surfaces here.

use super::{list_or_none, placeholder_names, working_dir};
use crate::cli::CheckArgs;
use promptgen::config::Config;
use promptgen::document::{Document, load_document};
use promptgen::error::Result;
use promptgen::imports::ImportMap;
use promptgen::pipeline::{Pipeline, PipelineOptions};

/// Execute the `promptgen check` command.
pub fn cmd_check(args: CheckArgs) -> Result<()> {
    let document = load_document(&args.file)?;

    println!("File:         {}", args.file.display());
    println!("Kind:         {}", document.kind().as_str());

    match document {
        Document::Template(doc) => {
            println!("Name:         {}", doc.name);
            println!(
                "Placeholders: {}",
                list_or_none(&placeholder_names(&[doc.template.as_str(), doc.negative_prompt.as_str()])?)
            );
            println!("Imports:      {}", list_or_none(&import_names(&doc.imports)));
        }
        Document::Chunk(doc) => {
            println!("Type:         {}", doc.chunk_type);
            println!(
                "Placeholders: {}",
                list_or_none(&placeholder_names(&[doc.template.as_str()])?)
            );
            let defaults: Vec<String> = doc.defaults.keys().cloned().collect();
            println!("Defaults:     {}", list_or_none(&defaults));
            println!("Imports:      {}", list_or_none(&import_names(&doc.imports)));
        }
        Document::Prompt(doc) => {
            let (config, config_dir) = Config::discover(args.config.as_deref(), &working_dir()?)?;
            let options = PipelineOptions {
                rng_seed: config.rng_seed,
                style: config.style_options(None, &config_dir)?,
                ..Default::default()
            };
            let pipeline = Pipeline::from_prompt(&doc, options)?;
            let generator = pipeline.generate()?;
            let product_order: Vec<String> = generator
                .placeholder_names()
                .into_iter()
                .map(str::to_string)
                .collect();
            let generation = pipeline.generation();

            println!("Name:         {}", pipeline.name());
            for (i, path) in pipeline.chain().iter().enumerate() {
                let label = if i == 0 { "Chain:" } else { "" };
                println!("{:<14}{}", label, path.display());
            }
            println!("Placeholders: {}", list_or_none(&product_order));
            println!(
                "Imports:      {}",
                list_or_none(&pipeline.context().available_imports())
            );
            println!(
                "Generation:   {:?}, seed {} ({:?}), max {}",
                generation.mode, generation.seed, generation.seed_mode, generation.max_images
            );
        }
        Document::Variations(dict) => {
            let multi_part = dict.iter().filter(|(_, value)| value.is_multi_part()).count();
            println!("Entries:      {}", dict.len());
            println!("Multi-part:   {}", multi_part);
        }
    }

    println!();
    println!("OK");
    Ok(())
}

fn import_names(imports: &ImportMap) -> Vec<String> {
    imports.specs().map(|(name, _)| name.to_string()).collect()
}
