//! Error types for promptgen.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.
//! Every variant is terminal for the resolution or generation call that raised it.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for promptgen operations.
#[derive(Error, Debug)]
pub enum PromptError {
    /// A required field is missing or has the wrong type.
    #[error("malformed document '{document}': {message}{}", hint_suffix(.hint))]
    MalformedDocument {
        document: String,
        message: String,
        hint: Option<String>,
    },

    /// A document or variation file does not exist.
    #[error("file not found: '{path}'")]
    DocumentNotFound { path: String },

    /// A file exists but is not valid YAML.
    #[error("failed to parse '{path}': {message}")]
    DocumentSyntax { path: String, message: String },

    /// A reserved token or reserved field name was used where it is not allowed.
    #[error("reserved placeholder misuse in '{document}': {message}")]
    ReservedPlaceholder { document: String, message: String },

    /// A file import points at a source that does not exist.
    #[error("import for '{placeholder}' not found: '{path}'")]
    ImportNotFound { placeholder: String, path: String },

    /// Two file sources merged into the same placeholder define the same key.
    #[error(
        "duplicate key '{key}' in imports for '{placeholder}': defined by both '{first_source}' and '{second_source}'"
    )]
    DuplicateImportKey {
        placeholder: String,
        key: String,
        first_source: String,
        second_source: String,
    },

    /// A multi-part variation entry has a non-string or nested part.
    #[error("invalid multi-part entry '{key}' in '{source_name}': {message}")]
    MultiPartShape {
        source_name: String,
        key: String,
        message: String,
    },

    /// A placeholder token or selector body could not be parsed.
    #[error("invalid selector in '{token}': {message}")]
    SelectorSyntax { token: String, message: String },

    /// One or more placeholders have no variation source.
    #[error(
        "unresolved placeholders: {}\n\nAvailable imports: {}",
        .missing.join(", "),
        available_list(.available)
    )]
    UnresolvedPlaceholders {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// A `@Chunk` reference names nothing that was imported.
    #[error("chunk '{name}' not found in imports")]
    ChunkNotFound { name: String },

    /// `{Name:part}` was used on a plain (single-value) variation.
    #[error("'{placeholder}' is not a multi-part variation; cannot select part '{part}'")]
    NotMultiPart { placeholder: String, part: String },

    /// A chunk references itself, directly or through other chunks.
    #[error("cyclic chunk reference: {}", .chain.join(" -> "))]
    CyclicChunkReference { chain: Vec<String> },

    /// An `implements:` chain loops back on itself.
    #[error("cyclic inheritance: {}", .chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    /// The configuration file or a CLI override is invalid.
    #[error("{0}")]
    Config(String),

    /// Printing results failed.
    #[error("failed to write output: {0}")]
    Output(String),
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!("\n\nHint: {}", hint),
        None => String::new(),
    }
}

fn available_list(available: &[String]) -> String {
    if available.is_empty() {
        "(none)".to_string()
    } else {
        available.join(", ")
    }
}

impl PromptError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            PromptError::Config(_) | PromptError::Output(_) => exit_codes::USER_ERROR,
            PromptError::MalformedDocument { .. }
            | PromptError::DocumentNotFound { .. }
            | PromptError::DocumentSyntax { .. }
            | PromptError::ReservedPlaceholder { .. }
            | PromptError::CyclicInheritance { .. } => exit_codes::DOCUMENT_FAILURE,
            PromptError::ImportNotFound { .. }
            | PromptError::DuplicateImportKey { .. }
            | PromptError::MultiPartShape { .. } => exit_codes::IMPORT_FAILURE,
            PromptError::SelectorSyntax { .. }
            | PromptError::UnresolvedPlaceholders { .. }
            | PromptError::ChunkNotFound { .. }
            | PromptError::NotMultiPart { .. }
            | PromptError::CyclicChunkReference { .. } => exit_codes::RESOLUTION_FAILURE,
        }
    }

    pub(crate) fn malformed(document: impl Into<String>, message: impl Into<String>) -> Self {
        PromptError::MalformedDocument {
            document: document.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub(crate) fn selector(token: impl Into<String>, message: impl Into<String>) -> Self {
        PromptError::SelectorSyntax {
            token: token.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for promptgen operations.
pub type Result<T> = std::result::Result<T, PromptError>;
