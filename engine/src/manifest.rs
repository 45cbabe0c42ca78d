//! Manifest types: the structural summary of a replica's items.
//!
//! A manifest pairs every item ID with its content hash. Manifests are the
//! unit of comparison for reconciliation and the unit of persistence for the
//! synchronized-baseline snapshot. They are compared structurally, never by
//! reference, and serialize deterministically.

use crate::{error::Result, ContentHash, Error, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the manifest encoding for future compatibility.
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// A replica's state at a point in time.
///
/// Uses BTreeMap so iteration and serialization order are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Manifest encoding version
    format_version: u32,
    /// Item IDs paired with their content hashes
    entries: BTreeMap<ItemId, ContentHash>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Record an item's hash, replacing any previous entry for the ID.
    pub fn insert(&mut self, id: impl Into<ItemId>, hash: impl Into<ContentHash>) {
        self.entries.insert(id.into(), hash.into());
    }

    /// Remove an item's entry. Returns the hash it carried, if any.
    pub fn remove(&mut self, id: &str) -> Option<ContentHash> {
        self.entries.remove(id)
    }

    /// Look up the hash recorded for an ID.
    pub fn hash_of(&self, id: &str) -> Option<&ContentHash> {
        self.entries.get(id)
    }

    /// Whether the manifest has an entry for the ID.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &ContentHash)> {
        self.entries.iter()
    }

    /// Iterate IDs in order.
    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.entries.keys()
    }

    /// Serialize to JSON with deterministic ordering.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidManifest(e.to_string()))
    }

    /// Deserialize from JSON, rejecting encodings from a future version.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidManifest(e.to_string()))?;

        if manifest.format_version > MANIFEST_FORMAT_VERSION {
            return Err(Error::UnsupportedManifestVersion {
                found: manifest.format_version,
                supported: MANIFEST_FORMAT_VERSION,
            });
        }

        Ok(manifest)
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<(ItemId, ContentHash)> for Manifest {
    fn from_iter<T: IntoIterator<Item = (ItemId, ContentHash)>>(iter: T) -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            entries: iter.into_iter().collect(),
        }
    }
}
