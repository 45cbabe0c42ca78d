//! Wire message definitions for the peripheral protocol.
//!
//! Requests and responses are grouped by subsystem and framed with a
//! correlation id. The codec that maps these values to the physical serial
//! framing lives outside this crate; everything here is the typed boundary
//! it produces and consumes.

use chrono::{DateTime, Utc};
use ferry_engine::ContentHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Correlation id embedded in every frame.
pub type CommandId = u32;

/// Correlation id carried by unsolicited frames. Session-assigned ids start
/// at 1 and never take this value.
pub const UNSOLICITED_ID: CommandId = 0;

/// Reboot target for the system subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebootMode {
    /// Restart into the normal firmware
    Os,
    /// Restart into the firmware updater
    Firmware,
}

/// Hardware input key on the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKey {
    Up,
    Down,
    Left,
    Right,
    Ok,
    Back,
}

/// Phase of an injected key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPhase {
    Press,
    Release,
    Short,
    Long,
}

/// System subsystem requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemRequest {
    Info,
    Ping { bytes: Vec<u8> },
    Reboot { mode: RebootMode },
    GetDate,
    SetDate { date: DateTime<Utc> },
    Alert,
}

/// Storage subsystem requests. Paths are absolute device paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageRequest {
    Info { path: String },
    List { path: String },
    Create { path: String, is_directory: bool },
    Delete { path: String, force: bool },
    Read { path: String },
    Write { path: String, bytes: Vec<u8> },
    Move { from: String, to: String },
    Hash { path: String },
}

/// GUI subsystem requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GuiRequest {
    ScreenStream { on: bool },
    Button { key: InputKey, phase: InputPhase },
    VirtualDisplay { on: bool },
}

/// A request to the peripheral, grouped by subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subsystem", rename_all = "snake_case")]
pub enum Request {
    System(SystemRequest),
    Storage(StorageRequest),
    Gui(GuiRequest),
}

/// Metadata for one directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub is_directory: bool,
}

/// A response from the peripheral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Command succeeded with no payload
    Ok,
    SystemInfo { entries: BTreeMap<String, String> },
    Pong { bytes: Vec<u8> },
    Date { date: DateTime<Utc> },
    StorageInfo { total_space: u64, free_space: u64 },
    FileList { entries: Vec<FileInfo> },
    FileData { bytes: Vec<u8> },
    HashSum { hash: ContentHash },
    /// Command failed on the device
    Error { message: String },
}

impl Response {
    /// Variant name for protocol error reporting.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Response::Ok => "ok",
            Response::SystemInfo { .. } => "system_info",
            Response::Pong { .. } => "pong",
            Response::Date { .. } => "date",
            Response::StorageInfo { .. } => "storage_info",
            Response::FileList { .. } => "file_list",
            Response::FileData { .. } => "file_data",
            Response::HashSum { .. } => "hash_sum",
            Response::Error { .. } => "error",
        }
    }
}

/// A display frame pushed by the peripheral without a matching request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScreenFrame {
    /// Raw frame buffer bytes, in the device's native format
    pub data: Vec<u8>,
}

/// Payload of one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameContent {
    Request(Request),
    Response(Response),
    ScreenFrame(ScreenFrame),
}

/// One frame on the wire: a correlation id plus its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Frame {
    pub id: CommandId,
    pub content: FrameContent,
}

impl Frame {
    /// Frame carrying a request under a session-assigned id.
    pub fn request(id: CommandId, request: Request) -> Self {
        Self {
            id,
            content: FrameContent::Request(request),
        }
    }

    /// Frame carrying a response correlated to a request id.
    pub fn response(id: CommandId, response: Response) -> Self {
        Self {
            id,
            content: FrameContent::Response(response),
        }
    }

    /// Unsolicited screen frame.
    pub fn screen(frame: ScreenFrame) -> Self {
        Self {
            id: UNSOLICITED_ID,
            content: FrameContent::ScreenFrame(frame),
        }
    }

    /// Whether this frame was pushed without a matching request.
    pub fn is_unsolicited(&self) -> bool {
        self.id == UNSOLICITED_ID
    }
}
