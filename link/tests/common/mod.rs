//! Shared fixtures for link integration tests: a loopback transport, a
//! call-recording connector, and a scripted fake device.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ferry_link::proto::{
    FileInfo, Frame, FrameContent, Request, Response, StorageRequest, SystemRequest,
};
use ferry_link::{Binding, Connector, FrameSink, LinkError, PeripheralId, TransportEvent};
use tokio::sync::{mpsc, watch};

/// Install the test log subscriber once per process; respects RUST_LOG.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test side of a loopback transport binding.
pub struct Harness {
    /// Frames the session transmitted
    pub sent: mpsc::UnboundedReceiver<Frame>,
    /// Injection point for decoded inbound events
    pub inbound: mpsc::UnboundedSender<TransportEvent>,
}

/// Build a loopback binding plus its test harness.
pub fn binding() -> (Binding, Harness) {
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    let binding = Binding {
        sink: Arc::new(ChannelSink(sent_tx)),
        events: inbound_rx,
    };
    let harness = Harness {
        sent: sent_rx,
        inbound: inbound_tx,
    };

    (binding, harness)
}

struct ChannelSink(mpsc::UnboundedSender<Frame>);

#[async_trait]
impl FrameSink for ChannelSink {
    async fn transmit(&self, frame: Frame) -> ferry_link::Result<()> {
        self.0.send(frame).map_err(|_| LinkError::Disconnected)
    }
}

/// Connector that records connect/disconnect calls.
pub struct RecordingConnector {
    calls: Mutex<Vec<String>>,
    connected_tx: watch::Sender<Vec<PeripheralId>>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        let (connected_tx, _) = watch::channel(Vec::new());
        Self {
            calls: Mutex::new(Vec::new()),
            connected_tx,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn connect(&self, peripheral: &PeripheralId) -> ferry_link::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("connect:{}", peripheral));
        Ok(())
    }

    async fn disconnect(&self, peripheral: &PeripheralId) -> ferry_link::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("disconnect:{}", peripheral));
        Ok(())
    }

    fn connected(&self) -> watch::Receiver<Vec<PeripheralId>> {
        self.connected_tx.subscribe()
    }
}

/// Digest both the fake device and the in-memory replicas use, so the two
/// sides agree on content hashes.
pub fn toy_hash(data: &[u8]) -> String {
    let sum: u64 = data.iter().map(|b| *b as u64).sum();
    format!("{:08x}-{}", sum, data.len())
}

/// A scripted peripheral with a flat path -> bytes storage.
#[derive(Default)]
pub struct FakeDevice {
    pub storage: BTreeMap<String, Vec<u8>>,
}

impl FakeDevice {
    pub fn respond(&mut self, request: &Request) -> Response {
        match request {
            Request::System(SystemRequest::Ping { bytes }) => Response::Pong {
                bytes: bytes.clone(),
            },
            Request::System(_) => Response::Ok,
            Request::Gui(_) => Response::Ok,
            Request::Storage(StorageRequest::List { path }) => {
                let prefix = format!("{}/", path.trim_end_matches('/'));
                let entries = self
                    .storage
                    .iter()
                    .filter_map(|(key, data)| {
                        let rest = key.strip_prefix(&prefix)?;
                        if rest.contains('/') {
                            return None;
                        }
                        Some(FileInfo {
                            name: rest.to_string(),
                            size: data.len() as u64,
                            is_directory: false,
                        })
                    })
                    .collect();
                Response::FileList { entries }
            }
            Request::Storage(StorageRequest::Read { path }) => match self.storage.get(path) {
                Some(data) => Response::FileData {
                    bytes: data.clone(),
                },
                None => Response::Error {
                    message: format!("no such file: {}", path),
                },
            },
            Request::Storage(StorageRequest::Write { path, bytes }) => {
                self.storage.insert(path.clone(), bytes.clone());
                Response::Ok
            }
            Request::Storage(StorageRequest::Delete { path, .. }) => {
                self.storage.remove(path);
                Response::Ok
            }
            Request::Storage(StorageRequest::Hash { path }) => match self.storage.get(path) {
                Some(data) => Response::HashSum {
                    hash: toy_hash(data),
                },
                None => Response::Error {
                    message: format!("no such file: {}", path),
                },
            },
            Request::Storage(_) => Response::Ok,
        }
    }
}

/// Service transmitted frames with the fake device until the harness side
/// closes. The device is shared so tests can inspect or seed its storage.
pub fn serve(device: Arc<Mutex<FakeDevice>>, mut harness: Harness) {
    tokio::spawn(async move {
        while let Some(frame) = harness.sent.recv().await {
            if let FrameContent::Request(request) = &frame.content {
                let response = device.lock().unwrap().respond(request);
                if harness
                    .inbound
                    .send(TransportEvent::Frame(Frame::response(frame.id, response)))
                    .is_err()
                {
                    break;
                }
            }
        }
    });
}
