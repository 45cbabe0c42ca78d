//! Change classification between a live manifest and the snapshot baseline.

use crate::{ItemId, Manifest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How an item changed relative to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present now, absent in the snapshot
    Added,
    /// Present in both, differing hash
    Modified,
    /// Absent now, present in the snapshot
    Deleted,
}

impl ChangeKind {
    /// Whether the change leaves content on the replica (added or modified).
    pub fn is_content(&self) -> bool {
        matches!(self, ChangeKind::Added | ChangeKind::Modified)
    }
}

/// Per-replica classification of items relative to the snapshot.
///
/// Produced independently for each replica; an ID absent from the set is
/// unchanged on that replica.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: BTreeMap<ItemId, ChangeKind>,
}

impl ChangeSet {
    /// Classify every ID of `current` and `base` as added, modified or
    /// deleted. IDs with an identical hash on both sides are unchanged and
    /// get no entry.
    pub fn between(current: &Manifest, base: &Manifest) -> Self {
        let mut changes = BTreeMap::new();

        for (id, hash) in current.iter() {
            match base.hash_of(id) {
                None => {
                    changes.insert(id.clone(), ChangeKind::Added);
                }
                Some(known) if known != hash => {
                    changes.insert(id.clone(), ChangeKind::Modified);
                }
                Some(_) => {}
            }
        }

        for id in base.ids() {
            if !current.contains(id) {
                changes.insert(id.clone(), ChangeKind::Deleted);
            }
        }

        Self { changes }
    }

    /// Look up the change recorded for an ID.
    pub fn get(&self, id: &str) -> Option<ChangeKind> {
        self.changes.get(id).copied()
    }

    /// Iterate changes in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, ChangeKind)> {
        self.changes.iter().map(|(id, kind)| (id, *kind))
    }

    /// Iterate changed IDs in order.
    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.changes.keys()
    }

    /// Number of changed items.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
