//! Placeholder token scanning.
//!
//! Grammar: `{Name}`, `{Name[selector]}`, `{Name:part}`. A selector and a
//! part on the same token is a syntax error. Brace groups that do not start
//! with an identifier (`{ "json": 1 }`) are plain text.

use super::selector::Selector;
use crate::error::{PromptError, Result};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)((?:\[[^\[\]{}]*\]|:[A-Za-z0-9_]*)*)\}")
        .expect("placeholder pattern is valid")
});

/// One placeholder occurrence in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderToken {
    pub name: String,
    pub selector: Option<Selector>,
    pub part: Option<String>,
    /// Byte range of the whole token in the scanned text.
    pub span: Range<usize>,
}

impl PlaceholderToken {
    /// Token text with `name` swapped for `target`, suffix preserved.
    pub fn renamed(&self, text: &str, target: &str) -> String {
        let raw = &text[self.span.clone()];
        format!("{{{}{}", target, &raw[1 + self.name.len()..])
    }
}

/// Find every placeholder token in `text`, in order of appearance.
pub fn scan_tokens(text: &str) -> Result<Vec<PlaceholderToken>> {
    TOKEN_RE
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).expect("capture 0 always exists");
            let name = caps[1].to_string();
            let suffix = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let (selector, part) = parse_suffix(suffix, whole.as_str())?;
            Ok(PlaceholderToken {
                name,
                selector,
                part,
                span: whole.range(),
            })
        })
        .collect()
}

/// Parse a single token such as `{Hair[#1]}`; `None` if `text` is not one.
pub fn parse_token(text: &str) -> Result<Option<PlaceholderToken>> {
    let trimmed = text.trim();
    let tokens = scan_tokens(trimmed)?;
    Ok(match tokens.into_iter().next() {
        Some(token) if token.span == (0..trimmed.len()) => Some(token),
        _ => None,
    })
}

fn parse_suffix(suffix: &str, token: &str) -> Result<(Option<Selector>, Option<String>)> {
    let mut selector = None;
    let mut part = None;
    let mut rest = suffix;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('[') {
            let end = after.find(']').unwrap_or(after.len());
            if selector.is_some() {
                return Err(PromptError::selector(token, "only one [selector] is allowed"));
            }
            selector = Some(Selector::parse(&after[..end], token)?);
            rest = after.get(end + 1..).unwrap_or("");
        } else if let Some(after) = rest.strip_prefix(':') {
            let end = after.find(['[', ':']).unwrap_or(after.len());
            let name = &after[..end];
            if name.is_empty() {
                return Err(PromptError::selector(token, "empty part name after ':'"));
            }
            if part.is_some() {
                return Err(PromptError::selector(token, "only one :part is allowed"));
            }
            part = Some(name.to_string());
            rest = &after[end..];
        } else {
            break;
        }
    }

    if selector.is_some() && part.is_some() {
        return Err(PromptError::selector(
            token,
            "a [selector] and a :part cannot be combined on the same placeholder",
        ));
    }
    Ok((selector, part))
}
