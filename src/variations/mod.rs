//! Variation dictionaries.
//!
//! A variation dictionary is an ordered mapping from a stable key to either a
//! plain string or a multi-part entry (named string parts such as `main` and
//! `lora`). Dictionaries are loaded from YAML files whose top level is a
//! mapping:
//!
//! ```text
//! BobCut: short bob cut hair
//! Braids:
//!   main: long braided hair
//!   lora: <lora:braids:0.7>
//! ```

mod dictionary;
mod loader;


pub use dictionary::{VariationDictionary, VariationValue};
pub use loader::{load_variations, variations_from_yaml};
pub(crate) use loader::{describe, scalar_text};
