//! Error types for the Ferry engine.

use thiserror::Error;

/// All possible errors from the Ferry engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("unsupported manifest format version: {found} (max supported: {supported})")]
    UnsupportedManifestVersion { found: u32, supported: u32 },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
