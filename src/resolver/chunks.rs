//! Chunk expansion (phase 1).
//!
//! `@Name` and `@{Name with Param:{Source[sel]}, Other:literal}` are replaced
//! by the referenced chunk's template, expanded recursively. Inside a chunk,
//! placeholders bound by arguments or `defaults:` are substituted; every other
//! placeholder is left intact for phase 2.

use super::context::{Binding, ResolvedContext};
use super::placeholders::{addressed_value, value_text};
use super::token::{PlaceholderToken, parse_token, scan_tokens};
use crate::error::{PromptError, Result};
use crate::imports::ResolvedImports;
use crate::variations::{VariationDictionary, VariationValue};
use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

static CHUNK_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*")
        .expect("chunk name pattern is valid")
});

/// Result of expanding chunk references in one text.
#[derive(Debug, Clone, Default)]
pub struct ChunkExpansion {
    pub text: String,
    /// Variation dictionaries declared by expanded chunks, for placeholders
    /// the chunk text leaves to phase 2.
    pub imports: ResolvedImports,
}

/// Expand every chunk reference in `text`.
pub fn expand_chunks<R: Rng + ?Sized>(
    text: &str,
    ctx: &ResolvedContext,
    rng: &mut R,
) -> Result<ChunkExpansion> {
    let mut expander = ChunkExpander {
        rng,
        stack: Vec::new(),
        contributed: ResolvedImports::new(),
    };
    let text = expander.expand(text, ctx)?;
    Ok(ChunkExpansion {
        text,
        imports: expander.contributed,
    })
}

/// One parsed `@...` reference.
#[derive(Debug, PartialEq, Eq)]
struct ChunkReference {
    name: String,
    /// `(parameter, expression)` pairs in call order.
    arguments: Vec<(String, String)>,
}

/// How one chunk argument binds its parameter.
enum Argument {
    Value(VariationValue),
    Forward(String),
}

struct ChunkExpander<'r, R: ?Sized> {
    rng: &'r mut R,
    /// `(document id, reference name)` of chunks being expanded.
    stack: Vec<(String, String)>,
    contributed: ResolvedImports,
}

impl<R: Rng + ?Sized> ChunkExpander<'_, R> {
    fn expand(&mut self, text: &str, ctx: &ResolvedContext) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(at) = rest.find('@') {
            out.push_str(&rest[..at]);
            let after = &rest[at + 1..];

            if out.ends_with(|c: char| c.is_alphanumeric()) {
                // Mid-word `@`, as in `user@example.com` or `<lora:name@v2:0.7>`.
                out.push('@');
                rest = after;
            } else if after.starts_with('{') {
                let end = matching_brace(after).ok_or_else(|| {
                    PromptError::selector(after, "unclosed '@{' chunk reference")
                })?;
                let reference = parse_call(&after[1..end], &after[..=end])?;
                out.push_str(&self.expand_reference(&reference, ctx)?);
                rest = &after[end + 1..];
            } else if let Some(m) = CHUNK_NAME_RE.find(after) {
                let reference = ChunkReference {
                    name: m.as_str().to_string(),
                    arguments: Vec::new(),
                };
                out.push_str(&self.expand_reference(&reference, ctx)?);
                rest = &after[m.end()..];
            } else {
                out.push('@');
                rest = after;
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    fn expand_reference(&mut self, reference: &ChunkReference, ctx: &ResolvedContext) -> Result<String> {
        let entry = ctx.chunk(&reference.name).ok_or_else(|| PromptError::ChunkNotFound {
            name: reference.name.clone(),
        })?;

        let id = entry.document.path.display().to_string();
        if self.stack.iter().any(|(seen, _)| *seen == id) {
            let mut chain: Vec<String> = self.stack.iter().map(|(_, name)| name.clone()).collect();
            chain.push(reference.name.clone());
            return Err(PromptError::CyclicChunkReference { chain });
        }

        let mut arguments = BTreeMap::new();
        let mut forwarded = BTreeMap::new();
        for (param, expression) in &reference.arguments {
            match self.resolve_argument(expression, ctx)? {
                Argument::Value(value) => {
                    arguments.insert(param.clone(), value);
                }
                Argument::Forward(target) => {
                    forwarded.insert(param.clone(), target);
                }
            }
        }
        debug!(
            chunk = %reference.name,
            arguments = arguments.len(),
            forwarded = forwarded.len(),
            "expanding chunk"
        );

        let scope = ctx.chunk_scope(entry, arguments, forwarded);
        self.stack.push((id, reference.name.clone()));
        let expanded = self.expand(&entry.document.template, &scope);
        self.stack.pop();

        let text = substitute_bound(&expanded?, &scope)?;
        self.contributed.absorb_missing_variations(&entry.imports);
        Ok(text)
    }

    fn resolve_argument(&mut self, expression: &str, ctx: &ResolvedContext) -> Result<Argument> {
        let Some(token) = parse_token(expression)? else {
            return Ok(Argument::Value(VariationValue::Scalar(expression.trim().to_string())));
        };
        let bare = token.selector.is_none() && token.part.is_none();

        match ctx.binding(&token.name) {
            Binding::Override(value) | Binding::Default(value) => {
                Ok(Argument::Value(addressed_value(&token, value)?))
            }
            Binding::Alias(target) if bare => Ok(Argument::Forward(target.to_string())),
            Binding::Alias(target) => match ctx.imports.variations(target) {
                Some(dict) => self.pick(&token, dict),
                None => Ok(Argument::Value(VariationValue::empty())),
            },
            Binding::Import(_) if bare => Ok(Argument::Forward(token.name.clone())),
            Binding::Import(dict) => self.pick(&token, dict),
            Binding::Removed => Ok(Argument::Value(VariationValue::empty())),
            Binding::Missing => Err(PromptError::UnresolvedPlaceholders {
                missing: vec![token.name.clone()],
                available: ctx.available_imports(),
            }),
        }
    }

    /// One value from the selector's candidates: the only one, or a random one.
    fn pick(
        &mut self,
        token: &PlaceholderToken,
        dict: &VariationDictionary,
    ) -> Result<Argument> {
        let selector = token.selector.clone().unwrap_or_default();
        let candidates = selector.select(dict, &mut *self.rng);
        let value = candidates
            .choose(&mut *self.rng)
            .and_then(|&i| dict.get_index(i))
            .map(|(_, value)| addressed_value(token, value))
            .transpose()?
            .unwrap_or_else(VariationValue::empty);
        Ok(Argument::Value(value))
    }
}

/// Substitute placeholders bound in a chunk scope; leave the rest intact.
fn substitute_bound(text: &str, scope: &ResolvedContext) -> Result<String> {
    let tokens = scan_tokens(text)?;
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for token in &tokens {
        out.push_str(&text[last..token.span.start]);
        match scope.binding(&token.name) {
            Binding::Override(value) | Binding::Default(value) => {
                out.push_str(&value_text(token, value)?)
            }
            Binding::Alias(target) => out.push_str(&token.renamed(text, target)),
            _ => out.push_str(&text[token.span.clone()]),
        }
        last = token.span.end;
    }
    out.push_str(&text[last..]);
    Ok(out)
}

/// Byte index of the `}` closing the `{` at the start of `text`.
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the inside of `@{...}`: `Name` or `Name with P:expr, Q:expr`.
fn parse_call(body: &str, raw: &str) -> Result<ChunkReference> {
    let body = body.trim();
    let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
    let name = &body[..name_end];
    if !CHUNK_NAME_RE.find(name).is_some_and(|m| m.end() == name.len()) {
        return Err(PromptError::selector(raw, format!("invalid chunk name '{}'", name)));
    }

    let rest = body[name_end..].trim_start();
    if rest.is_empty() {
        return Ok(ChunkReference {
            name: name.to_string(),
            arguments: Vec::new(),
        });
    }
    let Some(args) = rest.strip_prefix("with").filter(|a| a.starts_with(char::is_whitespace))
    else {
        return Err(PromptError::selector(raw, "expected 'with' after the chunk name"));
    };

    let arguments = split_top_level(args)
        .into_iter()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|arg| {
            let (param, expression) = arg.split_once(':').ok_or_else(|| {
                PromptError::selector(raw, format!("argument '{}' is not 'Name:value'", arg))
            })?;
            let param = param.trim();
            if param.is_empty() {
                return Err(PromptError::selector(raw, "argument with an empty name"));
            }
            Ok((param.to_string(), expression.trim().to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ChunkReference {
        name: name.to_string(),
        arguments,
    })
}

/// Split on commas outside `{}` and `[]`.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
