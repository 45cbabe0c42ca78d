//! Persistence of the synchronized-baseline manifest.
//!
//! The snapshot is one value with an explicit load-at-sync-start /
//! store-at-sync-end lifecycle. Absence is valid and means no pass has
//! ever completed.

use std::path::PathBuf;

use async_trait::async_trait;
use ferry_engine::Manifest;
use tokio::sync::Mutex;

use crate::error::{LinkError, Result};

/// Keyed storage for the last synchronized manifest.
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Load the last synchronized manifest, if one was ever stored.
    async fn load(&self) -> Result<Option<Manifest>>;

    /// Replace the stored manifest.
    async fn store(&self, manifest: &Manifest) -> Result<()>;
}

/// In-memory store for tests and ephemeral hosts.
#[derive(Default)]
pub struct MemoryManifestStore {
    slot: Mutex<Option<Manifest>>,
}

impl MemoryManifestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ManifestStore for MemoryManifestStore {
    async fn load(&self) -> Result<Option<Manifest>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn store(&self, manifest: &Manifest) -> Result<()> {
        *self.slot.lock().await = Some(manifest.clone());
        Ok(())
    }
}

/// JSON-file-backed store using the engine's deterministic manifest
/// encoding.
pub struct FileManifestStore {
    path: PathBuf,
}

impl FileManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ManifestStore for FileManifestStore {
    async fn load(&self) -> Result<Option<Manifest>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(LinkError::Store(err.to_string())),
        };

        Ok(Some(Manifest::from_json(&json)?))
    }

    async fn store(&self, manifest: &Manifest) -> Result<()> {
        let json = manifest.to_json()?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|err| LinkError::Store(err.to_string()))
    }
}
