//! Command implementations for promptgen.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod check;
mod generate;

use crate::cli::Command;
use promptgen::error::{PromptError, Result};
use promptgen::resolver::scan_tokens;
use std::path::PathBuf;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Generate(args) => generate::cmd_generate(args),
        Command::Check(args) => check::cmd_check(args),
    }
}

/// Working directory, used to find `promptgen.yaml`.
fn working_dir() -> Result<PathBuf> {
    std::env::current_dir()
        .map_err(|e| PromptError::Config(format!("cannot read the working directory: {}", e)))
}

/// Distinct placeholder names in `texts`, in order of first appearance.
fn placeholder_names(texts: &[&str]) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for text in texts {
        for token in scan_tokens(text)? {
            if !names.contains(&token.name) {
                names.push(token.name);
            }
        }
    }
    Ok(names)
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
