//! The synchronization pass: plan with the engine, apply through replicas.
//!
//! One pass is a single logical flow: actions run sequentially in ID
//! order, so event order is deterministic and the transport's
//! single-outstanding-request assumption holds. The pass is not a
//! transaction: a failure aborts the remainder and keeps the old baseline,
//! and a retried pass recomputes from there, naturally skipping whatever
//! was already applied.

use std::sync::Arc;

use ferry_engine::{Action, ChangeSet, ItemId, Manifest, SyncPlan};
use tokio::sync::broadcast;

use crate::archive::ArchiveReplica;
use crate::error::Result;
use crate::store::ManifestStore;

/// Outcome notification for one applied action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// An item arrived on the mobile replica
    Imported(ItemId),
    /// An item was pushed to the peripheral replica
    Exported(ItemId),
    /// An item was removed from one replica
    Deleted(ItemId),
}

/// Summary of a completed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Actions applied, conflicts included
    pub applied: usize,
    /// How many of those were conflict resolutions
    pub conflicts: usize,
}

/// Drives reconciliation between the two replicas.
pub struct Synchronizer {
    mobile: Arc<dyn ArchiveReplica>,
    peripheral: Arc<dyn ArchiveReplica>,
    store: Arc<dyn ManifestStore>,
    events: broadcast::Sender<SyncEvent>,
}

impl Synchronizer {
    pub fn new(
        mobile: Arc<dyn ArchiveReplica>,
        peripheral: Arc<dyn ArchiveReplica>,
        store: Arc<dyn ManifestStore>,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            mobile,
            peripheral,
            store,
            events,
        }
    }

    /// Subscribe to outcome events.
    ///
    /// Delivery is at-least-once to subscribers present when the event is
    /// emitted; past events are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Run one synchronization pass.
    ///
    /// On success the stored baseline advances to the mobile replica's
    /// post-apply manifest. On failure the baseline is left untouched and
    /// events for the actions that did complete stay emitted.
    pub async fn synchronize(&self) -> Result<SyncReport> {
        let snapshot = self.store.load().await?.unwrap_or_default();
        let mobile_now = self.mobile.manifest().await?;
        let peripheral_now = self.peripheral.manifest().await?;

        let plan = SyncPlan::resolve(
            &ChangeSet::between(&mobile_now, &snapshot),
            &ChangeSet::between(&peripheral_now, &snapshot),
            &mobile_now,
            &peripheral_now,
        );

        tracing::info!(
            actions = plan.len(),
            conflicts = plan.conflict_count(),
            "synchronization plan computed"
        );

        let mut report = SyncReport::default();

        for (id, action) in plan.iter() {
            self.apply(id, action, &mobile_now, &peripheral_now).await?;
            report.applied += 1;
            if action == Action::Conflict {
                report.conflicts += 1;
            }
        }

        let new_baseline = self.mobile.manifest().await?;
        self.store.store(&new_baseline).await?;

        tracing::info!(
            applied = report.applied,
            conflicts = report.conflicts,
            "synchronization pass complete"
        );

        Ok(report)
    }

    async fn apply(
        &self,
        id: &str,
        action: Action,
        mobile_now: &Manifest,
        peripheral_now: &Manifest,
    ) -> Result<()> {
        tracing::debug!(id = %id, action = ?action, "applying action");

        match action {
            Action::UpdateToPeripheral => {
                let item = self.mobile.read(id).await?;
                self.peripheral.upsert(item).await?;
                self.emit(SyncEvent::Exported(id.to_string()));
            }
            Action::UpdateToMobile => {
                let item = self.peripheral.read(id).await?;
                self.mobile.upsert(item).await?;
                self.emit(SyncEvent::Imported(id.to_string()));
            }
            Action::DeleteOnMobile => {
                self.mobile.delete(id).await?;
                self.emit(SyncEvent::Deleted(id.to_string()));
            }
            Action::DeleteOnPeripheral => {
                self.peripheral.delete(id).await?;
                self.emit(SyncEvent::Deleted(id.to_string()));
            }
            Action::Conflict => {
                self.resolve_conflict(id, mobile_now, peripheral_now).await?;
            }
        }

        Ok(())
    }

    /// Duplicate-and-keep-both conflict resolution.
    ///
    /// The mobile variant moves to a timestamp-derived identity on both
    /// replicas; the peripheral variant takes the original ID. When one
    /// side deleted the item, the surviving variant is preserved and the
    /// deletion wins for the original ID.
    async fn resolve_conflict(
        &self,
        id: &str,
        mobile_now: &Manifest,
        peripheral_now: &Manifest,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis() as u64;

        let on_mobile = mobile_now.contains(id);
        let on_peripheral = peripheral_now.contains(id);

        if on_mobile {
            let ours = self.mobile.read(id).await?;
            let duplicate = ours.conflict_copy(now);
            let duplicate_id = duplicate.id.clone();

            self.mobile.upsert(duplicate.clone()).await?;
            self.peripheral.upsert(duplicate).await?;
            self.emit(SyncEvent::Exported(duplicate_id));
        }

        if on_peripheral {
            let theirs = self.peripheral.read(id).await?;
            self.mobile.upsert(theirs).await?;
            self.emit(SyncEvent::Imported(id.to_string()));
        } else {
            // Peripheral deleted the item; its data now lives on under the
            // duplicate identity, so the deletion propagates.
            self.mobile.delete(id).await?;
            self.emit(SyncEvent::Deleted(id.to_string()));
        }

        Ok(())
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine; events are notifications, not handoffs.
        let _ = self.events.send(event);
    }
}
