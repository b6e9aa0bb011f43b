//! CLI argument parsing for promptgen.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Promptgen: resolve prompt templates into prompt/seed lists.
///
/// Prompts are described with YAML documents:
/// - Templates wrap prompts (`*.template.yaml`)
/// - Chunks are reusable fragments (`*.chunk.yaml`)
/// - Prompts implement a template and choose how to explore variations
///   (`*.prompt.yaml`)
#[derive(Parser, Debug)]
#[command(name = "promptgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). Overrides `PROMPTGEN_LOG`.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for promptgen.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate prompts from a prompt document.
    ///
    /// Resolves the template chain, imports and chunks, then prints every
    /// generated prompt with its seed.
    Generate(GenerateArgs),

    /// Check a document without generating.
    ///
    /// Reports the document kind, name and referenced placeholders. Prompt
    /// documents are resolved through their imports so errors surface.
    Check(CheckArgs),
}

/// Output format for `generate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Text,
    Json,
}

/// Arguments for the `generate` command.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Prompt document (`*.prompt.yaml`).
    pub file: PathBuf,

    /// Output format (default from config, else text).
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Maximum number of prompts (overrides the document and config).
    #[arg(short = 'n', long)]
    pub max_images: Option<u64>,

    /// Seed for selection randomness, for reproducible output.
    #[arg(long)]
    pub rng_seed: Option<u64>,

    /// Style tag for variation files (`hair.yaml` -> `hair.<style>.yaml`).
    #[arg(long)]
    pub style: Option<String>,

    /// Theme file overriding variation sources.
    #[arg(long)]
    pub theme: Option<PathBuf>,

    /// Config file (default: `promptgen.yaml` in the working directory).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print prompts exactly as substituted, without separator cleanup.
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Any document: template, chunk, prompt or variation file.
    pub file: PathBuf,

    /// Config file used when resolving prompt imports.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_args() {
        let cli = Cli::try_parse_from([
            "promptgen",
            "-v",
            "generate",
            "portrait.prompt.yaml",
            "--format",
            "json",
            "-n",
            "5",
            "--rng-seed",
            "9",
            "--style",
            "cartoon",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.file, PathBuf::from("portrait.prompt.yaml"));
                assert_eq!(args.format, Some(FormatArg::Json));
                assert_eq!(args.max_images, Some(5));
                assert_eq!(args.rng_seed, Some(9));
                assert_eq!(args.style.as_deref(), Some("cartoon"));
                assert!(!args.raw);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_check_requires_file() {
        assert!(Cli::try_parse_from(["promptgen", "check"]).is_err());
        let cli = Cli::try_parse_from(["promptgen", "check", "hair.yaml"]).unwrap();
        assert!(matches!(cli.command, Command::Check(_)));
    }
}
