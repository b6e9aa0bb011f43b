//! Import resolution.
//!
//! Documents declare where each placeholder's values come from:
//!
//! ```text
//! imports:
//!   Hair: variations/hair.yaml            # file
//!   Mood: melancholic                     # inline literal
//!   Place:                                # merged list
//!     - variations/city.yaml
//!     - variations/nature.yaml
//!     - a quiet beach at dusk
//!   chunks:                               # nested group
//!     positive: chunks/positive.chunk.yaml
//!   Outfit: ~                             # removed
//! ```
//!
//! Inline literals get content-hash keys, so they never collide with keys
//! taken from files. Two files contributing the same key to one placeholder
//! is an error.

mod resolved;
mod resolver;
mod spec;
pub mod style;


pub use resolved::{ChunkEntry, ResolvedImport, ResolvedImports};
pub use resolver::{INLINE_KEY_PREFIX, ImportResolver, inline_key, resolve_imports};
pub use spec::{ImportMap, ImportSpec};
pub use style::{StyleOptions, ThemeDocument};
