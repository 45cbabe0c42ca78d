//! Reconciliation planning for the two archive replicas.
//!
//! This is the core of determinism. Given the change sets of the mobile and
//! peripheral replicas relative to the last synchronized snapshot, this
//! module produces the per-item actions that bring both replicas back into
//! agreement.
//!
//! # Algorithm
//!
//! 1. Take the union of both change sets
//! 2. Resolve one action per ID from the pair of change kinds
//! 3. Changes on exactly one side flow to the other side
//! 4. Incompatible changes on both sides become conflicts, resolved by
//!    duplication rather than loss

use crate::{ChangeKind, ChangeSet, ItemId, Manifest};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The single operation chosen to reconcile one item ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Copy the peripheral's version to the mobile replica
    UpdateToMobile,
    /// Remove the item from the mobile replica
    DeleteOnMobile,
    /// Copy the mobile version to the peripheral replica
    UpdateToPeripheral,
    /// Remove the item from the peripheral replica
    DeleteOnPeripheral,
    /// Changed incompatibly on both sides; keep both variants
    Conflict,
}

/// The reconciliation plan: one action per item that needs one.
///
/// IDs not present in either change set are already synchronized and get no
/// action. Iteration is in ID order, which is also the order actions are
/// applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    actions: BTreeMap<ItemId, Action>,
}

impl SyncPlan {
    /// Resolve one action per ID in the union of both change sets.
    ///
    /// The live manifests are consulted only to recognize the case where
    /// both replicas changed an item to the same resulting hash, which
    /// needs no action at all.
    pub fn resolve(
        mobile_changes: &ChangeSet,
        peripheral_changes: &ChangeSet,
        mobile_now: &Manifest,
        peripheral_now: &Manifest,
    ) -> Self {
        let ids: BTreeSet<&ItemId> = mobile_changes
            .ids()
            .chain(peripheral_changes.ids())
            .collect();

        let mut actions = BTreeMap::new();

        for id in ids {
            let mobile = mobile_changes.get(id);
            let peripheral = peripheral_changes.get(id);

            let action = match (mobile, peripheral) {
                // Changed on exactly one side
                (Some(m), None) => Some(if m.is_content() {
                    Action::UpdateToPeripheral
                } else {
                    Action::DeleteOnPeripheral
                }),
                (None, Some(p)) => Some(if p.is_content() {
                    Action::UpdateToMobile
                } else {
                    Action::DeleteOnMobile
                }),

                // Deleted on both: already agree
                (Some(ChangeKind::Deleted), Some(ChangeKind::Deleted)) => None,

                // Content changes on both: agree iff the hashes converged
                (Some(m), Some(p)) if m.is_content() && p.is_content() => {
                    if mobile_now.hash_of(id) == peripheral_now.hash_of(id) {
                        None
                    } else {
                        Some(Action::Conflict)
                    }
                }

                // Deleted on one side, changed on the other: preserve data
                (Some(_), Some(_)) => Some(Action::Conflict),

                (None, None) => None,
            };

            if let Some(action) = action {
                actions.insert(id.clone(), action);
            }
        }

        Self { actions }
    }

    /// Look up the action chosen for an ID.
    pub fn get(&self, id: &str) -> Option<Action> {
        self.actions.get(id).copied()
    }

    /// Iterate actions in ID order (the apply order).
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, Action)> {
        self.actions.iter().map(|(id, action)| (id, *action))
    }

    /// Number of planned actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the replicas already agree.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of planned conflict resolutions.
    pub fn conflict_count(&self) -> usize {
        self.actions
            .values()
            .filter(|a| matches!(a, Action::Conflict))
            .count()
    }
}
