//! Placeholder resolution (phase 2).

use super::context::{Binding, ResolvedContext};
use super::token::{PlaceholderToken, scan_tokens};
use crate::document::types::RESERVED_NAMES;
use crate::error::{PromptError, Result};
use crate::variations::{VariationDictionary, VariationValue, scalar_text};
use rand::Rng;
use std::collections::BTreeMap;

/// Per-combination values chosen by the generator.
pub type VariationState = BTreeMap<String, VariationValue>;

/// Resolve every placeholder token in `text`.
///
/// `state` takes priority over every layer of `ctx`. Names bound nowhere
/// resolve to empty text. A name bound only to an import dictionary takes
/// the first value its selector picks.
pub fn resolve_placeholders<R: Rng + ?Sized>(
    text: &str,
    ctx: &ResolvedContext,
    state: &VariationState,
    rng: &mut R,
) -> Result<String> {
    let tokens = scan_tokens(text)?;
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for token in &tokens {
        out.push_str(&text[last..token.span.start]);
        out.push_str(&token_text(token, ctx, state, rng)?);
        last = token.span.end;
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn token_text<R: Rng + ?Sized>(
    token: &PlaceholderToken,
    ctx: &ResolvedContext,
    state: &VariationState,
    rng: &mut R,
) -> Result<String> {
    if let Some(value) = state.get(&token.name) {
        return value_text(token, value);
    }
    if RESERVED_NAMES.contains(&token.name.as_str()) {
        return Ok(ctx
            .parameters
            .get(&token.name)
            .and_then(scalar_text)
            .unwrap_or_default());
    }

    match ctx.binding(&token.name) {
        Binding::Override(value) | Binding::Default(value) => value_text(token, value),
        Binding::Alias(target) => match state.get(target) {
            Some(value) => value_text(token, value),
            None => match ctx.binding(target) {
                Binding::Override(value) | Binding::Default(value) => value_text(token, value),
                Binding::Import(dict) => first_selected(token, dict, rng),
                _ => Ok(String::new()),
            },
        },
        Binding::Import(dict) => first_selected(token, dict, rng),
        Binding::Removed | Binding::Missing => Ok(String::new()),
    }
}

fn first_selected<R: Rng + ?Sized>(
    token: &PlaceholderToken,
    dict: &VariationDictionary,
    rng: &mut R,
) -> Result<String> {
    let selector = token.selector.clone().unwrap_or_default();
    match selector.select(dict, rng).first().and_then(|&i| dict.get_index(i)) {
        Some((_, value)) => value_text(token, value),
        None => Ok(String::new()),
    }
}

/// Text of `value` as addressed by `token` (whole value or one part).
pub(crate) fn value_text(token: &PlaceholderToken, value: &VariationValue) -> Result<String> {
    match &token.part {
        None => Ok(value.primary_text().to_string()),
        Some(part) => value
            .part(part)
            .map(str::to_string)
            .ok_or_else(|| PromptError::NotMultiPart {
                placeholder: token.name.clone(),
                part: part.clone(),
            }),
    }
}

/// `value` narrowed to the part addressed by `token`, if any.
pub(crate) fn addressed_value(
    token: &PlaceholderToken,
    value: &VariationValue,
) -> Result<VariationValue> {
    match &token.part {
        None => Ok(value.clone()),
        Some(_) => value_text(token, value).map(VariationValue::Scalar),
    }
}
