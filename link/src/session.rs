//! Protocol session: request/response correlation over one transport.
//!
//! One session owns one transport binding. Callers submit requests from any
//! task; the session serializes them onto the wire one at a time, pairs
//! each response with its originating request by correlation id, hands
//! unsolicited frames to the registered sink, and recovers from decode
//! failures by cycling the connection.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::error::{LinkError, Result};
use crate::proto::{CommandId, Frame, FrameContent, Request, Response, ScreenFrame, UNSOLICITED_ID};
use crate::transport::{Binding, Connector, FrameSink, PeripheralId, TransportEvent};

/// Queue ordering hint for requests not yet transmitted.
///
/// A high-priority request is dequeued ahead of normal-priority requests
/// submitted earlier but not yet sent. Once a request is on the wire it is
/// never reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    #[default]
    Normal,
    High,
}

/// Single-slot sink for unsolicited screen frames.
pub type ScreenSink = mpsc::UnboundedSender<ScreenFrame>;

enum Command {
    Send {
        request: Request,
        priority: Priority,
        reply: oneshot::Sender<Result<Response>>,
    },
    SetScreenSink(Option<ScreenSink>),
    Invalidate,
}

/// Handle to a running session.
///
/// Cheap to clone; all clones talk to the same session task. The task stops
/// when the session is invalidated, the transport closes, or every handle
/// is dropped, failing the requests still pending in every case.
#[derive(Clone)]
pub struct Session {
    commands: mpsc::UnboundedSender<Command>,
}

impl Session {
    /// Bind a session to a peripheral's transport and spawn its task.
    ///
    /// The connector is the one that owns the peripheral's physical link;
    /// the session drives it through a disconnect/reconnect cycle when the
    /// codec reports an unrecoverable decode failure.
    pub fn bind(
        peripheral: PeripheralId,
        binding: Binding,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        tracing::info!(peripheral = %peripheral, "session bound");

        let task = SessionTask {
            peripheral,
            sink: binding.sink,
            connector,
            queue: BinaryHeap::new(),
            in_flight: None,
            screen_sink: None,
            next_id: 0,
            next_seq: 0,
        };
        tokio::spawn(task.run(binding.events, commands_rx));

        Self {
            commands: commands_tx,
        }
    }

    /// Send a request at the default queue position and await its response.
    pub async fn send(&self, request: Request) -> Result<Response> {
        self.send_with_priority(request, Priority::Normal).await
    }

    /// Send a request with an explicit queue ordering hint.
    ///
    /// Suspends the caller until the matching response arrives, the session
    /// is invalidated, or a terminal decode error occurs.
    pub async fn send_with_priority(
        &self,
        request: Request,
        priority: Priority,
    ) -> Result<Response> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Send {
                request,
                priority,
                reply: reply_tx,
            })
            .map_err(|_| LinkError::SessionInvalidated)?;

        reply_rx.await.map_err(|_| LinkError::SessionInvalidated)?
    }

    /// Register (or clear) the sink for unsolicited screen frames.
    ///
    /// The slot holds at most one sink; registering replaces any previous
    /// one. Screen frames never complete a pending request.
    pub fn set_screen_sink(&self, sink: Option<ScreenSink>) {
        let _ = self.commands.send(Command::SetScreenSink(sink));
    }

    /// Fail all pending requests and stop the session task.
    pub fn invalidate(&self) {
        let _ = self.commands.send(Command::Invalidate);
    }
}

/// A request waiting for its turn on the wire.
struct QueuedRequest {
    request: Request,
    priority: Priority,
    /// Submission order, used as the tie-break within a priority
    seq: u64,
    reply: oneshot::Sender<Result<Response>>,
}

impl PartialEq for QueuedRequest {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedRequest {}

impl Ord for QueuedRequest {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: higher priority first, then earlier submission.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct InFlight {
    id: CommandId,
    reply: oneshot::Sender<Result<Response>>,
}

struct SessionTask {
    peripheral: PeripheralId,
    sink: Arc<dyn FrameSink>,
    connector: Arc<dyn Connector>,
    queue: BinaryHeap<QueuedRequest>,
    in_flight: Option<InFlight>,
    screen_sink: Option<ScreenSink>,
    next_id: CommandId,
    next_seq: u64,
}

impl SessionTask {
    async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        loop {
            self.pump().await;

            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Send { request, priority, reply }) => {
                        self.enqueue(request, priority, reply);
                    }
                    Some(Command::SetScreenSink(sink)) => {
                        self.screen_sink = sink;
                    }
                    Some(Command::Invalidate) | None => {
                        self.fail_all(|| LinkError::SessionInvalidated);
                        break;
                    }
                },
                event = events.recv() => match event {
                    Some(TransportEvent::Frame(frame)) => {
                        self.handle_frame(frame).await;
                    }
                    Some(TransportEvent::DecodeError(reason)) => {
                        self.recover(reason).await;
                    }
                    Some(TransportEvent::Closed) | None => {
                        self.fail_all(|| LinkError::SessionInvalidated);
                        break;
                    }
                },
            }
        }

        tracing::info!(peripheral = %self.peripheral, "session stopped");
    }

    fn enqueue(
        &mut self,
        request: Request,
        priority: Priority,
        reply: oneshot::Sender<Result<Response>>,
    ) {
        self.next_seq += 1;
        self.queue.push(QueuedRequest {
            request,
            priority,
            seq: self.next_seq,
            reply,
        });
    }

    /// Put the next queued request on the wire if nothing is in flight.
    async fn pump(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        let Some(queued) = self.queue.pop() else {
            return;
        };

        let id = self.allocate_id();
        tracing::debug!(peripheral = %self.peripheral, id, "transmitting request");

        match self.sink.transmit(Frame::request(id, queued.request)).await {
            Ok(()) => {
                self.in_flight = Some(InFlight {
                    id,
                    reply: queued.reply,
                });
            }
            Err(err) => {
                // The binding is on its way out; a Closed event will fail
                // whatever is still queued.
                tracing::warn!(peripheral = %self.peripheral, error = %err, "transmit failed");
                let _ = queued.reply.send(Err(err));
            }
        }
    }

    fn allocate_id(&mut self) -> CommandId {
        self.next_id = self.next_id.wrapping_add(1);
        if self.next_id == UNSOLICITED_ID {
            self.next_id = 1;
        }
        self.next_id
    }

    async fn handle_frame(&mut self, frame: Frame) {
        match frame.content {
            FrameContent::ScreenFrame(screen) if frame.id == UNSOLICITED_ID => {
                self.dispatch_screen_frame(screen);
            }
            FrameContent::Response(response) => match self.in_flight.take() {
                Some(in_flight) if in_flight.id == frame.id => {
                    tracing::trace!(peripheral = %self.peripheral, id = frame.id, "response matched");
                    let _ = in_flight.reply.send(Ok(response));
                }
                other => {
                    self.in_flight = other;
                    self.recover(format!("response with unmatched correlation id {}", frame.id))
                        .await;
                }
            },
            _ => {
                self.recover(format!(
                    "frame {} matches no pending request or unsolicited class",
                    frame.id
                ))
                .await;
            }
        }
    }

    fn dispatch_screen_frame(&mut self, screen: ScreenFrame) {
        match &self.screen_sink {
            Some(sink) => {
                if sink.send(screen).is_err() {
                    // Receiver dropped; clear the slot.
                    self.screen_sink = None;
                }
            }
            None => {
                tracing::trace!(peripheral = %self.peripheral, "screen frame dropped, no sink");
            }
        }
    }

    /// Decode-failure recovery: fail every pending request, then cycle the
    /// connection once. The failed requests are not retried here; callers
    /// own retry policy.
    async fn recover(&mut self, reason: String) {
        tracing::warn!(
            peripheral = %self.peripheral,
            reason = %reason,
            "decode failure, cycling connection"
        );

        self.fail_all(|| LinkError::Decode(reason.clone()));

        if let Err(err) = self.connector.disconnect(&self.peripheral).await {
            tracing::warn!(peripheral = %self.peripheral, error = %err, "recovery disconnect failed");
        }
        if let Err(err) = self.connector.connect(&self.peripheral).await {
            tracing::warn!(peripheral = %self.peripheral, error = %err, "recovery reconnect failed");
        }
    }

    fn fail_all(&mut self, error: impl Fn() -> LinkError) {
        if let Some(in_flight) = self.in_flight.take() {
            let _ = in_flight.reply.send(Err(error()));
        }
        while let Some(queued) = self.queue.pop() {
            let _ = queued.reply.send(Err(error()));
        }
    }
}
