//! Generation settings, enums, and serde default helpers for documents.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Token a template must contain; receives the prompt text.
pub const PROMPT_TOKEN: &str = "{prompt}";
/// Token a template may contain; receives the prompt's negative text.
pub const NEGPROMPT_TOKEN: &str = "{negprompt}";
/// Token reserved for LoRA tags.
pub const LORAS_TOKEN: &str = "{loras}";

/// Placeholder names that are never resolved from imports.
pub const RESERVED_NAMES: [&str; 3] = ["prompt", "negprompt", "loras"];

/// Seed handed to the image service when it should pick its own seed.
pub const RANDOM_SEED_SENTINEL: i64 = -1;

/// How the variation space is explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Weight-ordered nested loops over every selected value (default).
    #[default]
    Combinatorial,
    /// Unique random draws.
    Random,
}

impl GenerationMode {
    /// Parse a generation mode from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "combinatorial" => Some(Self::Combinatorial),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

/// How seeds are assigned to generated prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
    /// Every prompt gets the base seed.
    Fixed,
    /// `base_seed + index` over the whole output (default).
    #[default]
    Progressive,
    /// The image service chooses; prompts carry the sentinel seed.
    Random,
}

impl SeedMode {
    /// Parse a seed mode from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(Self::Fixed),
            "progressive" => Some(Self::Progressive),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

/// The `generation:` block of a prompt document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSpec {
    pub mode: GenerationMode,

    /// Base seed for `fixed` and `progressive` seed modes.
    pub seed: i64,

    pub seed_mode: SeedMode,

    /// Upper bound on the number of generated prompts.
    pub max_images: u64,

    /// Explicit seed list; when present every selected variation is paired
    /// with each of these seeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seeds: Option<Vec<i64>>,
}

impl Default for GenerationSpec {
    fn default() -> Self {
        Self {
            mode: GenerationMode::default(),
            seed: default_seed(),
            seed_mode: SeedMode::default(),
            max_images: default_max_images(),
            seeds: None,
        }
    }
}

pub(crate) fn default_seed() -> i64 {
    42
}
pub(crate) fn default_max_images() -> u64 {
    10
}
pub(crate) fn default_version() -> String {
    "1.0".to_string()
}

/// Accept any YAML scalar (so `version: 2.0` works) and keep its text.
pub(crate) fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    crate::variations::scalar_text(&value)
        .ok_or_else(|| serde::de::Error::custom("expected a scalar value"))
}

/// Mapping of names to scalars, each kept as text (`Age: 20` is `"20"`).
pub(crate) fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_yaml::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(name, value)| match crate::variations::scalar_text(&value) {
            Some(text) => Ok((name, text)),
            None => Err(serde::de::Error::custom(format!(
                "default '{}' must be a scalar value",
                name
            ))),
        })
        .collect()
}
