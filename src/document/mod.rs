//! Document model and parser.
//!
//! Configuration documents are YAML files of three kinds:
//!
//! - **Template** (`*.template.yaml`): a wrapper whose `template` text contains
//!   the `{prompt}` token.
//! - **Chunk** (`*.chunk.yaml`): a reusable fragment injected with `@Name`;
//!   must not use the reserved tokens `{prompt}`, `{negprompt}`, `{loras}`.
//! - **Prompt** (`*.prompt.yaml`): a leaf document that `implements` a
//!   template and carries the `generation` settings.
//!
//! Any other mapping is treated as a variation dictionary.
//!
//! # Example
//!
//! ```text
//! version: "2.0"
//! name: portrait
//! implements: ../templates/base.template.yaml
//! generation:
//!   mode: combinatorial
//!   seed: 100
//!   seed_mode: progressive
//!   max_images: 20
//! imports:
//!   Hair: ../variations/hair.yaml
//! prompt: "1girl, {Hair[$2]}, {Expression[$10]}"
//! ```

mod loader;
mod model;
mod parser;
pub mod types;

#[cfg(test)]
mod tests;

pub use loader::load_yaml;
pub use model::{
    ChunkDocument, Document, DocumentKind, Parameters, PromptDocument, TemplateDocument,
};
pub use parser::{load_chunk, load_document, load_prompt, load_template, parse_as, parse_document};
pub use types::{GenerationMode, GenerationSpec, SeedMode};
