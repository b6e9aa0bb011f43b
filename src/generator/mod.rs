//! Prompt generation over the resolved variation space.
//!
//! Every placeholder left in the (chunk-expanded) template becomes a
//! dimension whose candidates are the values its selector picks. Dimensions
//! with weight > 0 form a Cartesian product ordered by weight (lowest weight
//! is the outermost loop); `$0` dimensions are drawn at random for each
//! prompt. Random mode draws every dimension uniformly and never repeats a
//! combination.
//!
//! Selection randomness comes from its own generator, never from the
//! document's `seed`; pass [`GeneratorOptions::rng_seed`] for reproducible
//! draws.

mod product;


pub use product::CartesianProduct;

use crate::document::types::{RANDOM_SEED_SENTINEL, RESERVED_NAMES};
use crate::document::{GenerationMode, GenerationSpec, Parameters, SeedMode};
use crate::error::{PromptError, Result};
use crate::normalize::normalize_prompt;
use crate::resolver::{Binding, ResolvedContext, VariationState, resolve_placeholders, scan_tokens};
use crate::variations::VariationValue;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Random-mode draws allowed per requested prompt.
pub const RETRY_FACTOR: u64 = 10;

/// One resolved prompt, ready for an image service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPrompt {
    pub prompt: String,
    pub negative_prompt: String,
    pub seed: i64,
    /// Value chosen for each placeholder.
    pub variations: VariationState,
    pub parameters: Parameters,
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Seed for selection randomness. `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
    /// Clean up separators left by empty substitutions.
    pub normalize: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            rng_seed: None,
            normalize: true,
        }
    }
}

/// A placeholder and its candidate values, in selection order.
#[derive(Debug, Clone)]
struct Dimension {
    name: String,
    weight: u32,
    values: Vec<VariationValue>,
}

#[derive(Debug)]
enum StateSource {
    Combinatorial(CartesianProduct),
    Random(UniqueDraws),
}

/// Uniform index tuples that never repeat, within a draw budget.
#[derive(Debug)]
struct UniqueDraws {
    sizes: Vec<usize>,
    seen: HashSet<Vec<usize>>,
    attempts: u64,
    budget: u64,
    /// Number of distinct tuples, `None` when it overflows.
    space: Option<u128>,
}

impl UniqueDraws {
    fn new(sizes: Vec<usize>, max_images: u64) -> Self {
        let space = CartesianProduct::new(sizes.clone()).total();
        Self {
            sizes,
            seen: HashSet::new(),
            attempts: 0,
            budget: max_images.saturating_mul(RETRY_FACTOR),
            space,
        }
    }

    /// Next unseen tuple, or `None` once the space or the budget runs out.
    fn next_tuple<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Vec<usize>> {
        loop {
            if self.space.is_some_and(|total| self.seen.len() as u128 >= total) {
                info!(unique = self.seen.len(), "every combination produced");
                return None;
            }
            if self.attempts >= self.budget {
                warn!(
                    unique = self.seen.len(),
                    attempts = self.attempts,
                    "random draw budget exhausted, returning fewer prompts"
                );
                return None;
            }
            self.attempts += 1;

            let tuple: Vec<usize> = self.sizes.iter().map(|&n| rng.gen_range(0..n)).collect();
            if self.seen.insert(tuple.clone()) {
                return Some(tuple);
            }
        }
    }
}

/// Lazy sequence of [`GeneratedPrompt`]s. Consume it once.
#[derive(Debug)]
pub struct PromptGenerator {
    template: String,
    negative: String,
    ctx: ResolvedContext,
    spec: GenerationSpec,
    normalize: bool,
    /// Product dimensions, outermost first.
    combinatorial: Vec<Dimension>,
    /// `$0` dimensions.
    free: Vec<Dimension>,
    source: StateSource,
    seeds: Vec<i64>,
    /// Current state and the position of the next seed to pair it with.
    sweep: Option<(VariationState, usize)>,
    emitted: u64,
    rng: StdRng,
}

/// Start generating prompts from `template` and `negative`.
///
/// Fails with [`PromptError::UnresolvedPlaceholders`] listing every name that
/// has no import, before anything is generated.
pub fn generate(
    template: &str,
    negative: &str,
    ctx: &ResolvedContext,
    spec: &GenerationSpec,
    options: &GeneratorOptions,
) -> Result<PromptGenerator> {
    PromptGenerator::new(template, negative, ctx.clone(), spec.clone(), options)
}

impl PromptGenerator {
    pub fn new(
        template: &str,
        negative: &str,
        ctx: ResolvedContext,
        spec: GenerationSpec,
        options: &GeneratorOptions,
    ) -> Result<Self> {
        let mut rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let dimensions = collect_dimensions(&[template, negative], &ctx, &mut rng)?;
        let (free, mut combinatorial): (Vec<_>, Vec<_>) =
            dimensions.into_iter().partition(|d| d.weight == 0);
        combinatorial.sort_by_key(|d| d.weight);

        let source = match spec.mode {
            GenerationMode::Combinatorial => StateSource::Combinatorial(CartesianProduct::new(
                combinatorial.iter().map(|d| d.values.len()).collect(),
            )),
            GenerationMode::Random => StateSource::Random(UniqueDraws::new(
                combinatorial
                    .iter()
                    .chain(&free)
                    .map(|d| d.values.len())
                    .collect(),
                spec.max_images,
            )),
        };

        info!(
            mode = ?spec.mode,
            seed_mode = ?spec.seed_mode,
            max_images = spec.max_images,
            combinatorial = combinatorial.len(),
            free = free.len(),
            "starting generation"
        );
        for dimension in &combinatorial {
            debug!(
                placeholder = %dimension.name,
                weight = dimension.weight,
                candidates = dimension.values.len(),
                "combinatorial dimension"
            );
        }

        Ok(Self {
            template: template.to_string(),
            negative: negative.to_string(),
            seeds: spec.seeds.clone().unwrap_or_default(),
            ctx,
            spec,
            normalize: options.normalize,
            combinatorial,
            free,
            source,
            sweep: None,
            emitted: 0,
            rng,
        })
    }

    /// Placeholder names in product order (outermost first), then `$0` names.
    pub fn placeholder_names(&self) -> Vec<&str> {
        self.combinatorial
            .iter()
            .chain(&self.free)
            .map(|d| d.name.as_str())
            .collect()
    }

    fn next_state(&mut self) -> Option<VariationState> {
        let mut state = VariationState::new();

        match &mut self.source {
            StateSource::Combinatorial(product) => {
                let tuple = product.next()?;
                for (dimension, index) in self.combinatorial.iter().zip(tuple) {
                    state.insert(dimension.name.clone(), dimension.values[index].clone());
                }
                for dimension in &self.free {
                    let index = self.rng.gen_range(0..dimension.values.len());
                    state.insert(dimension.name.clone(), dimension.values[index].clone());
                }
            }
            StateSource::Random(draws) => {
                let tuple = draws.next_tuple(&mut self.rng)?;
                for (dimension, index) in self.combinatorial.iter().chain(&self.free).zip(tuple) {
                    state.insert(dimension.name.clone(), dimension.values[index].clone());
                }
            }
        }

        Some(state)
    }

    fn seed_for(&self, index: u64) -> i64 {
        match self.spec.seed_mode {
            SeedMode::Fixed => self.spec.seed,
            SeedMode::Progressive => self.spec.seed.saturating_add_unsigned(index),
            SeedMode::Random => RANDOM_SEED_SENTINEL,
        }
    }

    fn render(&mut self, state: VariationState, seed: i64) -> Result<GeneratedPrompt> {
        let mut prompt = resolve_placeholders(&self.template, &self.ctx, &state, &mut self.rng)?;
        let mut negative_prompt =
            resolve_placeholders(&self.negative, &self.ctx, &state, &mut self.rng)?;
        if self.normalize {
            prompt = normalize_prompt(&prompt);
            negative_prompt = normalize_prompt(&negative_prompt);
        }
        Ok(GeneratedPrompt {
            prompt,
            negative_prompt,
            seed,
            variations: state,
            parameters: self.ctx.parameters.clone(),
        })
    }
}

impl Iterator for PromptGenerator {
    type Item = Result<GeneratedPrompt>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted >= self.spec.max_images {
            return None;
        }

        let (state, seed) = if self.seeds.is_empty() {
            let state = self.next_state()?;
            (state, self.seed_for(self.emitted))
        } else {
            if self.sweep.as_ref().is_none_or(|(_, pos)| *pos >= self.seeds.len()) {
                let state = self.next_state()?;
                self.sweep = Some((state, 0));
            }
            let (state, pos) = self.sweep.as_mut()?;
            let seed = self.seeds[*pos];
            *pos += 1;
            (state.clone(), seed)
        };

        self.emitted += 1;
        Some(self.render(state, seed))
    }
}

/// Build one dimension per distinct placeholder name, in order of first
/// appearance. The first token naming a placeholder supplies its selector.
fn collect_dimensions<R: Rng + ?Sized>(
    texts: &[&str],
    ctx: &ResolvedContext,
    rng: &mut R,
) -> Result<Vec<Dimension>> {
    let mut dimensions = Vec::new();
    let mut seen = HashSet::new();
    let mut missing = Vec::new();

    for text in texts {
        for token in scan_tokens(text)? {
            if RESERVED_NAMES.contains(&token.name.as_str()) || !seen.insert(token.name.clone()) {
                continue;
            }
            let dict = match ctx.binding(&token.name) {
                Binding::Import(dict) => dict,
                Binding::Missing => {
                    missing.push(token.name.clone());
                    continue;
                }
                _ => continue,
            };

            let selector = token.selector.clone().unwrap_or_default();
            let mut values: Vec<VariationValue> = selector
                .select(dict, rng)
                .into_iter()
                .filter_map(|i| dict.get_index(i).map(|(_, value)| value.clone()))
                .collect();
            if values.is_empty() {
                debug!(placeholder = %token.name, "no candidates, using an empty value");
                values.push(VariationValue::empty());
            }

            dimensions.push(Dimension {
                name: token.name.clone(),
                weight: selector.weight(),
                values,
            });
        }
    }

    if !missing.is_empty() {
        return Err(PromptError::UnresolvedPlaceholders {
            missing,
            available: ctx.available_imports(),
        });
    }
    Ok(dimensions)
}
