//! # Ferry Link
//!
//! The IO side of Ferry: a request/response protocol session over a
//! peripheral's serial transport, a typed remote-procedure facade for
//! device operations (system control, file storage, input injection,
//! display streaming), and the synchronization driver that mirrors the
//! host archive with the device archive using the plans computed by
//! [`ferry_engine`].
//!
//! ## Layering
//!
//! - [`transport`]: the codec/connector boundary this crate consumes,
//!   an outbound frame sink, a stream of decoded inbound events, and
//!   connection management owned by the pairing layer.
//! - [`session`]: one task per bound peripheral. Serializes requests onto
//!   the wire one at a time (priority-ordered while queued), correlates
//!   responses by command id, dispatches unsolicited screen frames, and
//!   cycles the connection on decode failures.
//! - [`rpc`]: typed wrappers for every device operation, validating each
//!   response variant. Constructed once, passed by handle.
//! - [`archive`] / [`store`]: the two replica backends and the persisted
//!   synchronized-baseline manifest.
//! - [`sync`]: the reconciliation pass driver, emitting ordered
//!   [`sync::SyncEvent`]s for observers.

pub mod archive;
pub mod config;
pub mod error;
pub mod proto;
pub mod rpc;
pub mod session;
pub mod store;
pub mod sync;
pub mod transport;

// Re-export main types at crate root
pub use archive::{ArchiveReplica, Hasher, MemoryArchive, PeripheralArchive};
pub use config::{Config, ConfigError};
pub use error::{LinkError, Result};
pub use rpc::Rpc;
pub use session::{Priority, ScreenSink, Session};
pub use store::{FileManifestStore, ManifestStore, MemoryManifestStore};
pub use sync::{SyncEvent, SyncReport, Synchronizer};
pub use transport::{Binding, Connector, FrameSink, PeripheralId, TransportEvent};
