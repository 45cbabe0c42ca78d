//! Archive replicas: the two stores reconciliation drives.
//!
//! Both replicas implement one capability contract so the synchronization
//! driver is written once against the abstract interface. The peripheral
//! replica routes every operation through the RPC facade; the in-memory
//! replica stands in for the host-local archive backend, whose real
//! persistence lives outside this crate.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use ferry_engine::{ArchiveItem, ContentHash, ItemId, Manifest};
use tokio::sync::Mutex;

use crate::error::{LinkError, Result};
use crate::rpc::Rpc;

/// Capability contract shared by both replicas.
#[async_trait]
pub trait ArchiveReplica: Send + Sync {
    /// Live read of the replica's manifest.
    async fn manifest(&self) -> Result<Manifest>;

    async fn read(&self, id: &str) -> Result<ArchiveItem>;

    async fn upsert(&self, item: ArchiveItem) -> Result<()>;

    /// Remove an item. Deleting an absent item is not an error, so a
    /// retried pass can re-apply its plan safely.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// The on-device replica, reached through the RPC facade.
///
/// Item IDs are file names inside the archive root directory on the
/// peripheral. Hashes are computed on the device via the storage hash
/// command, so the host never has to agree on an algorithm up front.
pub struct PeripheralArchive {
    rpc: Arc<Rpc>,
    root: String,
}

impl PeripheralArchive {
    pub fn new(rpc: Arc<Rpc>, root: impl Into<String>) -> Self {
        Self {
            rpc,
            root: root.into(),
        }
    }

    fn device_path(&self, id: &str) -> String {
        format!("{}/{}", self.root.trim_end_matches('/'), id)
    }
}

#[async_trait]
impl ArchiveReplica for PeripheralArchive {
    async fn manifest(&self) -> Result<Manifest> {
        let mut manifest = Manifest::new();

        for entry in self.rpc.list(&self.root).await? {
            if entry.is_directory {
                continue;
            }
            let hash = self.rpc.hash(&self.device_path(&entry.name)).await?;
            manifest.insert(entry.name, hash);
        }

        Ok(manifest)
    }

    async fn read(&self, id: &str) -> Result<ArchiveItem> {
        let path = self.device_path(id);
        let bytes = self.rpc.read(&path).await?;
        let hash = self.rpc.hash(&path).await?;
        Ok(ArchiveItem::new(id, file_name(id), bytes, hash))
    }

    async fn upsert(&self, item: ArchiveItem) -> Result<()> {
        self.rpc.write(&self.device_path(&item.id), item.data).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.rpc.delete(&self.device_path(id), false).await
    }
}

/// Content hasher injected into [`MemoryArchive`].
///
/// Must produce the same digests as the peer replica's backend, or every
/// pass would see phantom modifications.
pub type Hasher = Arc<dyn Fn(&[u8]) -> ContentHash + Send + Sync>;

/// In-memory replica, used as the host-local archive stand-in and by the
/// test suites.
pub struct MemoryArchive {
    items: Mutex<BTreeMap<ItemId, ArchiveItem>>,
    hasher: Hasher,
}

impl MemoryArchive {
    pub fn new(hasher: Hasher) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            hasher,
        }
    }

    /// Insert or replace content directly, the way a user edit would.
    pub async fn put(&self, id: impl Into<ItemId>, data: Vec<u8>) {
        let id = id.into();
        let hash = (self.hasher)(&data);
        let name = file_name(&id).to_string();
        self.items
            .lock()
            .await
            .insert(id.clone(), ArchiveItem::new(id, name, data, hash));
    }

    /// Remove content directly, the way a user delete would.
    pub async fn remove(&self, id: &str) {
        self.items.lock().await.remove(id);
    }

    pub async fn get(&self, id: &str) -> Option<ArchiveItem> {
        self.items.lock().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }
}

#[async_trait]
impl ArchiveReplica for MemoryArchive {
    async fn manifest(&self) -> Result<Manifest> {
        let items = self.items.lock().await;
        Ok(items
            .values()
            .map(|item| (item.id.clone(), item.hash.clone()))
            .collect())
    }

    async fn read(&self, id: &str) -> Result<ArchiveItem> {
        self.items
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| LinkError::ItemNotFound(id.to_string()))
    }

    async fn upsert(&self, item: ArchiveItem) -> Result<()> {
        // Re-hash so the manifest always reflects this backend's hasher.
        let hash = (self.hasher)(&item.data);
        let item = ArchiveItem { hash, ..item };
        self.items.lock().await.insert(item.id.clone(), item);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.items.lock().await.remove(id);
        Ok(())
    }
}

/// Last path segment of an ID.
fn file_name(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}
