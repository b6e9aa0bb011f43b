//! Implementation of the `promptgen generate` command.
//!
//! Resolves a prompt document and prints every generated prompt.

use super::working_dir;
use crate::cli::{FormatArg, GenerateArgs};
use promptgen::config::{Config, OutputFormat};
use promptgen::error::{PromptError, Result};
use promptgen::generator::GeneratedPrompt;
use promptgen::imports::ThemeDocument;
use promptgen::pipeline::{Pipeline, PipelineOptions};
use tracing::info;

/// Execute the `promptgen generate` command.
///
/// CLI flags override config values, which override the document's own
/// generation settings.
pub fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let (config, config_dir) = Config::discover(args.config.as_deref(), &working_dir()?)?;

    let mut style = config.style_options(args.style.as_deref(), &config_dir)?;
    if let Some(theme) = &args.theme {
        style.theme = Some(ThemeDocument::load(theme)?);
    }

    let max_images = args.max_images.or(config.max_images);
    if max_images == Some(0) {
        return Err(PromptError::Config(
            "--max-images must be greater than 0".to_string(),
        ));
    }

    let options = PipelineOptions {
        rng_seed: args.rng_seed.or(config.rng_seed),
        max_images,
        normalize: config.normalize_prompts && !args.raw,
        style,
    };
    let pipeline = Pipeline::from_prompt_file(&args.file, options)?;

    let format = match args.format {
        Some(FormatArg::Text) => OutputFormat::Text,
        Some(FormatArg::Json) => OutputFormat::Json,
        None => config.output_format,
    };

    let count = match format {
        OutputFormat::Json => {
            let prompts = pipeline.collect()?;
            let json = serde_json::to_string_pretty(&prompts)
                .map_err(|e| PromptError::Output(e.to_string()))?;
            println!("{}", json);
            prompts.len()
        }
        OutputFormat::Text => {
            println!("{}", pipeline.name());
            println!("================================================================================");
            let mut count = 0;
            for prompt in pipeline.generate()? {
                print_prompt(count, &prompt?);
                count += 1;
            }
            count
        }
    };

    info!(name = %pipeline.name(), count, "generation finished");
    Ok(())
}

fn print_prompt(index: usize, prompt: &GeneratedPrompt) {
    println!();
    println!("[{}] seed {}", index + 1, prompt.seed);
    println!("  prompt:   {}", prompt.prompt);
    if !prompt.negative_prompt.is_empty() {
        println!("  negative: {}", prompt.negative_prompt);
    }
}
