//! Layered resolution context.

use crate::document::Parameters;
use crate::imports::{ChunkEntry, ResolvedImports};
use crate::variations::{VariationDictionary, VariationValue};
use std::collections::{BTreeMap, BTreeSet};

/// Everything placeholders and chunk references resolve against.
///
/// Lookup priority for a placeholder: local override, then default, then
/// import dictionary. Built once per run and read-only during generation.
#[derive(Debug, Clone, Default)]
pub struct ResolvedContext {
    pub imports: ResolvedImports,
    /// Chunk-scope overrides (chunk arguments, or the generator's state).
    pub overrides: BTreeMap<String, VariationValue>,
    /// Document-level defaults (a chunk's `defaults:`).
    pub defaults: BTreeMap<String, VariationValue>,
    pub parameters: Parameters,
    /// Placeholders explicitly removed; they resolve to empty text.
    pub removed: BTreeSet<String>,
    /// Chunk arguments forwarded as another placeholder (`Hair:{HairStyles}`).
    pub aliases: BTreeMap<String, String>,
    /// Extra chunk tables searched before `imports`, innermost first.
    pub chunk_scopes: Vec<ResolvedImports>,
}

/// Where a placeholder's value comes from.
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    Override(&'a VariationValue),
    Default(&'a VariationValue),
    Alias(&'a str),
    Removed,
    Import(&'a VariationDictionary),
    Missing,
}

impl ResolvedContext {
    pub fn new(imports: ResolvedImports) -> Self {
        let removed = imports.removed().map(str::to_string).collect();
        Self {
            imports,
            removed,
            ..Default::default()
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Resolve where `name` is bound, following the priority order.
    pub fn binding(&self, name: &str) -> Binding<'_> {
        if let Some(value) = self.overrides.get(name) {
            Binding::Override(value)
        } else if let Some(value) = self.defaults.get(name) {
            Binding::Default(value)
        } else if let Some(target) = self.aliases.get(name) {
            Binding::Alias(target)
        } else if self.removed.contains(name) || self.imports.is_removed(name) {
            Binding::Removed
        } else if let Some(dict) = self.imports.variations(name) {
            Binding::Import(dict)
        } else {
            Binding::Missing
        }
    }

    /// Find a chunk by (possibly dotted) name.
    pub fn chunk(&self, name: &str) -> Option<&ChunkEntry> {
        self.chunk_scopes
            .iter()
            .find_map(|scope| scope.chunk(name))
            .or_else(|| self.imports.chunk(name))
    }

    /// Names of every variation dictionary available, for diagnostics.
    pub fn available_imports(&self) -> Vec<String> {
        self.imports.variation_names().map(str::to_string).collect()
    }

    /// Scope used while expanding `entry`: this context extended with the
    /// chunk's defaults, imports and nested chunks, plus call arguments.
    pub(crate) fn chunk_scope(
        &self,
        entry: &ChunkEntry,
        arguments: BTreeMap<String, VariationValue>,
        forwarded: BTreeMap<String, String>,
    ) -> ResolvedContext {
        let mut scope = self.clone();

        scope.defaults = entry
            .document
            .defaults
            .iter()
            .map(|(k, v)| (k.clone(), VariationValue::Scalar(v.clone())))
            .collect();

        scope.imports.absorb_missing_variations(&entry.imports);
        scope.chunk_scopes.insert(0, entry.imports.clone());
        scope.chunk_scopes.insert(0, entry.chunks.clone());

        for name in arguments.keys() {
            scope.aliases.remove(name);
        }
        for name in forwarded.keys() {
            scope.overrides.remove(name);
            scope.defaults.remove(name);
        }
        scope.overrides.extend(arguments);
        scope.aliases.extend(forwarded);
        scope
    }
}
