//! Promptgen: template resolution and combinatorial prompt generation.
//!
//! A prompt document implements a template, imports variation dictionaries
//! and chunks, and describes how to explore the variation space. The
//! [`pipeline::Pipeline`] ties the stages together:
//!
//! documents -> inheritance -> imports -> chunk expansion -> generation
//!
//! The output is an ordered sequence of [`generator::GeneratedPrompt`]
//! records (prompt text, negative text, seed, chosen variations, parameters).

pub mod config;
pub mod document;
pub mod error;
pub mod exit_codes;
pub mod generator;
pub mod imports;
pub mod inheritance;
pub mod normalize;
pub mod pipeline;
pub mod resolver;
pub mod variations;

#[cfg(test)]
mod test_support;
