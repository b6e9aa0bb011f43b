//! Two-phase template resolution.
//!
//! 1. **Chunks**: `@Name` / `@{Name with ...}` references are replaced by
//!    chunk text, with chunk parameters bound. See [`expand_chunks`].
//! 2. **Placeholders**: `{Name}`, `{Name[selector]}` and `{Name:part}` are
//!    replaced by variation values. See [`resolve_placeholders`].
//!
//! Phase 1 never touches placeholders outside chunk text, and phase 2 never
//! sees an `@` reference.

mod chunks;
mod context;
mod placeholders;
pub mod selector;
pub mod token;

#[cfg(test)]
mod tests;

pub use chunks::{ChunkExpansion, expand_chunks};
pub use context::{Binding, ResolvedContext};
pub use placeholders::{VariationState, resolve_placeholders};
pub use selector::{DEFAULT_WEIGHT, Selector};
pub use token::{PlaceholderToken, parse_token, scan_tokens};

use crate::error::Result;
use rand::Rng;

/// Resolve `text` once: expand chunks, then take the first selected value
/// for every placeholder.
pub fn resolve<R: Rng + ?Sized>(text: &str, ctx: &ResolvedContext, rng: &mut R) -> Result<String> {
    let expansion = expand_chunks(text, ctx, rng)?;
    if expansion.imports.is_empty() {
        return resolve_placeholders(&expansion.text, ctx, &VariationState::new(), rng);
    }

    let mut extended = ctx.clone();
    extended.imports.absorb_missing_variations(&expansion.imports);
    resolve_placeholders(&expansion.text, &extended, &VariationState::new(), rng)
}
