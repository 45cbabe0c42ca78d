//! # Ferry Engine
//!
//! The deterministic reconciliation core for mirroring a file archive
//! between a host and a serial-attached peripheral device.
//!
//! This crate decides *what* has to happen for the two replicas to agree
//! again; it never touches a transport, a file system or a clock. The
//! sibling `ferry-link` crate owns the IO side and drives the plans
//! produced here through its replica interfaces.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of devices, files or network
//! - **Deterministic**: same inputs always produce the same plan
//! - **Testable**: pure logic, no mocks needed
//! - **Two replicas, one pass**: reconciliation is an explicit pass between
//!   exactly two independently-mutable stores, not a general merge system
//!
//! ## Core Concepts
//!
//! ### Manifests
//!
//! A [`Manifest`] summarizes a replica as `(item ID, content hash)` pairs.
//! The manifest recorded at the end of the last successful pass is the
//! *snapshot*, the baseline every later comparison is made against. An
//! absent snapshot is an empty manifest: the first pass imports everything.
//!
//! ### Change sets
//!
//! [`ChangeSet::between`] classifies each ID of a live manifest against the
//! snapshot as [`ChangeKind::Added`], [`ChangeKind::Modified`] or
//! [`ChangeKind::Deleted`]. Each replica gets its own change set.
//!
//! ### Plans
//!
//! [`SyncPlan::resolve`] turns the two change sets into one [`Action`] per
//! item: changes on one side flow to the other, deletions propagate, and
//! incompatible changes become [`Action::Conflict`], resolved by keeping
//! both variants (see [`ArchiveItem::conflict_copy`]), never by discarding
//! data. Re-planning immediately after a fully applied pass yields an empty
//! plan.
//!
//! ## Quick Start
//!
//! ```rust
//! use ferry_engine::{Action, ChangeSet, Manifest, SyncPlan};
//!
//! // Last synchronized baseline
//! let snapshot = Manifest::new();
//!
//! // The host gained one file since then; the device is empty
//! let mut mobile = Manifest::new();
//! mobile.insert("notes.txt", "3f2a");
//! let peripheral = Manifest::new();
//!
//! let plan = SyncPlan::resolve(
//!     &ChangeSet::between(&mobile, &snapshot),
//!     &ChangeSet::between(&peripheral, &snapshot),
//!     &mobile,
//!     &peripheral,
//! );
//!
//! assert_eq!(plan.get("notes.txt"), Some(Action::UpdateToPeripheral));
//! ```

pub mod change;
pub mod error;
pub mod item;
pub mod manifest;
pub mod plan;

// Re-export main types at crate root
pub use change::{ChangeKind, ChangeSet};
pub use error::Error;
pub use item::{ArchiveItem, ItemStatus};
pub use manifest::{Manifest, MANIFEST_FORMAT_VERSION};
pub use plan::{Action, SyncPlan};

/// Type aliases for clarity
pub type ItemId = String;
pub type ItemName = String;
pub type ContentHash = String;
pub type Timestamp = u64;
