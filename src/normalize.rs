//! Prompt text cleanup after substitution.
//!
//! Empty substitutions leave artifacts such as `a, , b`, trailing commas and
//! doubled spaces. Normalization works line by line: segments between commas
//! are trimmed, empty segments dropped, and the rest joined with `", "`.
//! Blank lines are dropped.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("whitespace pattern is valid"));

/// Collapse separator and whitespace artifacts into canonical form.
pub fn normalize_prompt(text: &str) -> String {
    text.lines()
        .map(normalize_line)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_line(line: &str) -> String {
    line.split(',')
        .map(|segment| WHITESPACE_RE.replace_all(segment.trim(), " "))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
