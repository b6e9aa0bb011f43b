//! Resolved import tables.

use crate::document::ChunkDocument;
use crate::variations::VariationDictionary;
use std::collections::BTreeSet;

/// A resolved import: a variation dictionary, a loaded chunk, or a group.
#[derive(Debug, Clone)]
pub enum ResolvedImport {
    Variations(VariationDictionary),
    Chunk(Box<ChunkEntry>),
    Group(ResolvedImports),
}

/// A chunk with its own imports already resolved.
#[derive(Debug, Clone)]
pub struct ChunkEntry {
    pub document: ChunkDocument,
    /// Sources for the chunk's placeholders.
    pub imports: ResolvedImports,
    /// Nested chunk overrides; consulted before `imports` for `@` references.
    pub chunks: ResolvedImports,
}

/// Ordered `name -> ResolvedImport` table mirroring the declared structure.
#[derive(Debug, Clone, Default)]
pub struct ResolvedImports {
    entries: Vec<(String, ResolvedImport)>,
    removed: BTreeSet<String>,
}

impl ResolvedImports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. Clears any removal mark for the name.
    pub fn insert(&mut self, name: impl Into<String>, import: ResolvedImport) {
        let name = name.into();
        self.removed.remove(&name);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = import,
            None => self.entries.push((name, import)),
        }
    }

    /// Drop an entry and remember that it was removed on purpose.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| n != name);
        self.removed.insert(name.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedImport> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, i)| i)
    }

    /// Look up a dotted path such as `chunks.positive`.
    pub fn lookup(&self, dotted: &str) -> Option<&ResolvedImport> {
        let mut parts = dotted.split('.');
        let mut current = self.get(parts.next()?)?;
        for part in parts {
            match current {
                ResolvedImport::Group(group) => current = group.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    pub fn variations(&self, name: &str) -> Option<&VariationDictionary> {
        match self.get(name)? {
            ResolvedImport::Variations(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn chunk(&self, dotted: &str) -> Option<&ChunkEntry> {
        match self.lookup(dotted)? {
            ResolvedImport::Chunk(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn is_removed(&self, name: &str) -> bool {
        self.removed.contains(name)
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.removed.iter().map(String::as_str)
    }

    /// Names of top-level entries, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Names of top-level variation dictionaries, in order.
    pub fn variation_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|(n, i)| match i {
            ResolvedImport::Variations(_) => Some(n.as_str()),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `child` onto `self`: child entries replace by name and child
    /// removals delete inherited entries.
    pub fn overlay(&mut self, child: ResolvedImports) {
        for name in child.removed {
            self.remove(&name);
        }
        for (name, import) in child.entries {
            self.insert(name, import);
        }
    }

    /// Add variation dictionaries from `other` whose names are neither
    /// defined nor removed here. Returns the names that were added.
    pub fn absorb_missing_variations(&mut self, other: &ResolvedImports) -> Vec<String> {
        let mut added = Vec::new();
        for (name, import) in &other.entries {
            if let ResolvedImport::Variations(_) = import {
                if self.get(name).is_none() && !self.is_removed(name) {
                    self.entries.push((name.clone(), import.clone()));
                    added.push(name.clone());
                }
            }
        }
        added
    }
}

impl FromIterator<(String, VariationDictionary)> for ResolvedImports {
    fn from_iter<I: IntoIterator<Item = (String, VariationDictionary)>>(iter: I) -> Self {
        let mut imports = ResolvedImports::new();
        for (name, dict) in iter {
            imports.insert(name, ResolvedImport::Variations(dict));
        }
        imports
    }
}
