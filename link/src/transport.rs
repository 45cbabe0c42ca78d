//! Transport and connector boundaries.
//!
//! The physical serial link is owned by a pairing/connection manager
//! outside this crate. The session consumes it through a [`Binding`]: an
//! outbound [`FrameSink`] plus the stream of decoded inbound events
//! produced by the codec.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::error::Result;
use crate::proto::Frame;

/// Identity of a peripheral as assigned by the pairing layer.
pub type PeripheralId = String;

/// Outbound half of a transport binding.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Hand one frame to the codec for transmission.
    async fn transmit(&self, frame: Frame) -> Result<()>;
}

/// Decoded inbound traffic, as produced by the codec boundary.
#[derive(Debug)]
pub enum TransportEvent {
    /// A well-formed frame
    Frame(Frame),
    /// The codec could not decode an inbound frame
    DecodeError(String),
    /// The binding is gone (peripheral disconnected or unbound)
    Closed,
}

/// One bound transport: the sink plus the inbound event stream.
///
/// The event receiver is consumed by the session task. The sink survives
/// connector-level disconnect/reconnect cycles; a [`TransportEvent::Closed`]
/// event means the binding itself is gone and the session must be rebuilt.
pub struct Binding {
    pub sink: Arc<dyn FrameSink>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Connection management for peripherals.
///
/// Implemented by the pairing/connection manager. The session uses it for
/// its decode-failure recovery cycle; everything else about discovery and
/// pairing stays outside this crate.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, peripheral: &PeripheralId) -> Result<()>;

    async fn disconnect(&self, peripheral: &PeripheralId) -> Result<()>;

    /// Stream of currently connected peripherals.
    fn connected(&self) -> watch::Receiver<Vec<PeripheralId>>;
}
