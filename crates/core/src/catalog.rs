//! Artifact type catalog (PRD-72).
//!
//! Static `id -> name` mapping loaded once at startup from a JSON object
//! file and read-only thereafter. Lookup is total: an id that is not in the
//! catalog resolves to its own string form, so resolution never fails.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::error::CoreError;
use crate::types::TypeId;

/// Immutable artifact type catalog.
///
/// Held behind an `Arc` in application state; built exactly once per
/// process.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    names: BTreeMap<TypeId, String>,
    ids: Vec<TypeId>,
}

impl TypeCatalog {
    /// Build a catalog from an in-memory map.
    pub fn from_map(names: BTreeMap<TypeId, String>) -> Self {
        let ids = names.keys().cloned().collect();
        Self { names, ids }
    }

    /// Load a catalog from a reader yielding a JSON object of
    /// `{ "<id>": "<name>" }` pairs.
    pub fn from_reader(reader: impl Read) -> Result<Self, CoreError> {
        let names: BTreeMap<TypeId, String> = serde_json::from_reader(reader)
            .map_err(|e| CoreError::CatalogLoad(e.to_string()))?;
        Ok(Self::from_map(names))
    }

    /// Load a catalog from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            CoreError::CatalogLoad(format!("{}: {e}", path.display()))
        })?;
        Self::from_reader(file)
    }

    /// Resolve an artifact type id to its display name.
    ///
    /// Total function: unknown ids come back as themselves. A missing
    /// catalog entry is the default behavior, not a failure.
    pub fn resolve(&self, id: &str) -> String {
        self.names
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// All catalog ids, in stable (sorted) order. Used to expand the
    /// "all types" filter selection.
    pub fn ids(&self) -> &[TypeId] {
        &self.ids
    }

    /// Reverse lookup: ids whose display name matches `name` exactly.
    /// Multiple ids can share a name.
    pub fn name_to_ids(&self, name: &str) -> Vec<TypeId> {
        self.names
            .iter()
            .filter(|(_, n)| n.as_str() == name)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
