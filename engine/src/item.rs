//! Archive item values and status derivation.

use crate::{ContentHash, ItemId, ItemName, Manifest, Timestamp};
use serde::{Deserialize, Serialize};

/// Sync status of an item relative to the snapshot manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Not present in the snapshot yet
    Imported,
    /// Present in the snapshot with the same hash
    Synchronized,
    /// Present in the snapshot with a different hash
    Modified,
}

impl ItemStatus {
    /// Derive the status of an item from the snapshot manifest.
    pub fn derive(snapshot: &Manifest, id: &str, hash: &str) -> Self {
        match snapshot.hash_of(id) {
            None => ItemStatus::Imported,
            Some(known) if known != hash => ItemStatus::Modified,
            Some(_) => ItemStatus::Synchronized,
        }
    }
}

/// A single archive item as held by one replica.
///
/// Copies of the same item on the two replicas are independent values;
/// agreement is judged structurally through manifests, never by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveItem {
    /// Stable identity within a replica (path-derived or opaque key)
    pub id: ItemId,
    /// Human-readable name, usually a file name
    pub name: ItemName,
    /// Item content
    pub data: Vec<u8>,
    /// Content digest, as computed by the replica's backend
    pub hash: ContentHash,
}

impl ArchiveItem {
    /// Create a new item.
    pub fn new(
        id: impl Into<ItemId>,
        name: impl Into<ItemName>,
        data: Vec<u8>,
        hash: impl Into<ContentHash>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data,
            hash: hash.into(),
        }
    }

    /// Derive the duplicate identity used when the same item changed on
    /// both replicas. The content is preserved byte for byte; only the
    /// identity changes.
    ///
    /// The timestamp is supplied by the caller. The engine never reads a
    /// clock, so the same inputs always produce the same duplicate.
    pub fn conflict_copy(&self, timestamp: Timestamp) -> ArchiveItem {
        ArchiveItem {
            id: suffixed(&self.id, timestamp),
            name: suffixed(&self.name, timestamp),
            data: self.data.clone(),
            hash: self.hash.clone(),
        }
    }
}

/// Insert `-{timestamp}` ahead of the final extension, or append it when
/// there is none.
fn suffixed(name: &str, timestamp: Timestamp) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            format!("{}-{}.{}", stem, timestamp, ext)
        }
        _ => format!("{}-{}", name, timestamp),
    }
}
