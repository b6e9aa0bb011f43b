//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for prompt generation.
///
/// This struct represents the contents of `promptgen.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
/// Relative paths are resolved against the config file's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Generation settings
    // =========================================================================
    /// Seed for selection randomness (limit selectors, `$0` placeholders,
    /// random mode). Unset means a fresh seed every run; the documents'
    /// `seed` never feeds selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,

    /// Override for every prompt document's `generation.max_images`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_images: Option<u64>,

    /// Clean up separators left by empty substitutions.
    #[serde(default = "default_true")]
    pub normalize_prompts: bool,

    // =========================================================================
    // Style settings
    // =========================================================================
    /// Style tag applied to variation file imports (`hair.yaml` -> `hair.<style>.yaml`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_style: Option<String>,

    /// Path to a theme file whose imports override variation sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Directory holding shared style-suffixed variation files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_dir: Option<String>,

    // =========================================================================
    // Output settings
    // =========================================================================
    #[serde(default)]
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rng_seed: None,
            max_images: None,
            normalize_prompts: default_true(),
            default_style: None,
            theme: None,
            common_dir: None,
            output_format: OutputFormat::default(),
        }
    }
}
