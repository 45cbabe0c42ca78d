//! Typed remote-procedure facade over the session.
//!
//! One `Rpc` instance is constructed at startup and passed by handle to
//! every consumer, never held as global state. It owns the current
//! session, recreating it whenever the bound peripheral changes; operations
//! issued while nothing is bound fail with [`LinkError::NotConnected`].
//!
//! Every wrapper validates the response variant for its request; a
//! mismatch is a protocol error, fatal to that call only.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{LinkError, Result};
use crate::proto::{
    FileInfo, GuiRequest, InputKey, InputPhase, RebootMode, Request, Response, StorageRequest,
    SystemRequest,
};
use crate::session::{Priority, ScreenSink, Session};
use crate::transport::{Binding, Connector, PeripheralId};

/// Remote-procedure facade for one peripheral at a time.
pub struct Rpc {
    connector: Arc<dyn Connector>,
    session: RwLock<Option<Session>>,
}

impl Rpc {
    /// Create a facade with no peripheral bound.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            session: RwLock::new(None),
        }
    }

    /// Bind to a peripheral, replacing and invalidating any previous
    /// session. Requests pending on the old session fail with
    /// [`LinkError::SessionInvalidated`].
    pub async fn bind(&self, peripheral: PeripheralId, binding: Binding) {
        let session = Session::bind(peripheral, binding, Arc::clone(&self.connector));
        let mut slot = self.session.write().await;
        if let Some(old) = slot.replace(session) {
            old.invalidate();
        }
    }

    /// Drop the current session, returning to the unbound state.
    pub async fn unbind(&self) {
        if let Some(old) = self.session.write().await.take() {
            old.invalidate();
        }
    }

    /// Whether a peripheral is currently bound.
    pub async fn is_bound(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Register (or clear) the sink for unsolicited screen frames on the
    /// current session. The slot is per-session: rebinding clears it.
    pub async fn set_screen_sink(&self, sink: Option<ScreenSink>) -> Result<()> {
        self.current().await?.set_screen_sink(sink);
        Ok(())
    }

    /// Escape hatch: send a raw request with an explicit priority.
    pub async fn request(&self, request: Request, priority: Priority) -> Result<Response> {
        self.current().await?.send_with_priority(request, priority).await
    }

    async fn current(&self) -> Result<Session> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(LinkError::NotConnected)
    }

    /// Send a request, surfacing device-reported failures as
    /// [`LinkError::Device`].
    async fn call(&self, request: Request) -> Result<Response> {
        match self.current().await?.send(request).await? {
            Response::Error { message } => Err(LinkError::Device(message)),
            other => Ok(other),
        }
    }

    // System subsystem

    pub async fn system_info(&self) -> Result<BTreeMap<String, String>> {
        match self.call(Request::System(SystemRequest::Info)).await? {
            Response::SystemInfo { entries } => Ok(entries),
            other => Err(unexpected("system_info", other)),
        }
    }

    /// Echo test. The peripheral returns the same bytes.
    pub async fn ping(&self, bytes: Vec<u8>) -> Result<Vec<u8>> {
        match self.call(Request::System(SystemRequest::Ping { bytes })).await? {
            Response::Pong { bytes } => Ok(bytes),
            other => Err(unexpected("ping", other)),
        }
    }

    pub async fn reboot(&self, mode: RebootMode) -> Result<()> {
        self.expect_ok("reboot", Request::System(SystemRequest::Reboot { mode }))
            .await
    }

    pub async fn get_date(&self) -> Result<DateTime<Utc>> {
        match self.call(Request::System(SystemRequest::GetDate)).await? {
            Response::Date { date } => Ok(date),
            other => Err(unexpected("get_date", other)),
        }
    }

    pub async fn set_date(&self, date: DateTime<Utc>) -> Result<()> {
        self.expect_ok("set_date", Request::System(SystemRequest::SetDate { date }))
            .await
    }

    /// Make the peripheral notify its user (vibration/sound/LED, whatever
    /// the device supports). Jumps the queue so it stays responsive while a
    /// long transfer is queued.
    pub async fn alert(&self) -> Result<()> {
        match self
            .request(Request::System(SystemRequest::Alert), Priority::High)
            .await?
        {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(LinkError::Device(message)),
            other => Err(unexpected("alert", other)),
        }
    }

    // Storage subsystem

    pub async fn storage_info(&self, path: &str) -> Result<(u64, u64)> {
        let request = Request::Storage(StorageRequest::Info { path: path.into() });
        match self.call(request).await? {
            Response::StorageInfo {
                total_space,
                free_space,
            } => Ok((total_space, free_space)),
            other => Err(unexpected("storage_info", other)),
        }
    }

    pub async fn list(&self, path: &str) -> Result<Vec<FileInfo>> {
        let request = Request::Storage(StorageRequest::List { path: path.into() });
        match self.call(request).await? {
            Response::FileList { entries } => Ok(entries),
            other => Err(unexpected("list", other)),
        }
    }

    pub async fn create(&self, path: &str, is_directory: bool) -> Result<()> {
        let request = Request::Storage(StorageRequest::Create {
            path: path.into(),
            is_directory,
        });
        self.expect_ok("create", request).await
    }

    pub async fn delete(&self, path: &str, force: bool) -> Result<()> {
        let request = Request::Storage(StorageRequest::Delete {
            path: path.into(),
            force,
        });
        self.expect_ok("delete", request).await
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let request = Request::Storage(StorageRequest::Read { path: path.into() });
        match self.call(request).await? {
            Response::FileData { bytes } => Ok(bytes),
            other => Err(unexpected("read", other)),
        }
    }

    pub async fn write(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
        let request = Request::Storage(StorageRequest::Write {
            path: path.into(),
            bytes,
        });
        self.expect_ok("write", request).await
    }

    /// Storage move/rename.
    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let request = Request::Storage(StorageRequest::Move {
            from: from.into(),
            to: to.into(),
        });
        self.expect_ok("rename", request).await
    }

    /// Content digest of a file, computed on the device.
    pub async fn hash(&self, path: &str) -> Result<String> {
        let request = Request::Storage(StorageRequest::Hash { path: path.into() });
        match self.call(request).await? {
            Response::HashSum { hash } => Ok(hash),
            other => Err(unexpected("hash", other)),
        }
    }

    // GUI subsystem

    pub async fn screen_stream(&self, on: bool) -> Result<()> {
        self.expect_ok("screen_stream", Request::Gui(GuiRequest::ScreenStream { on }))
            .await
    }

    pub async fn send_button(&self, key: InputKey, phase: InputPhase) -> Result<()> {
        self.expect_ok("button", Request::Gui(GuiRequest::Button { key, phase }))
            .await
    }

    pub async fn virtual_display(&self, on: bool) -> Result<()> {
        self.expect_ok("virtual_display", Request::Gui(GuiRequest::VirtualDisplay { on }))
            .await
    }

    async fn expect_ok(&self, name: &'static str, request: Request) -> Result<()> {
        match self.call(request).await? {
            Response::Ok => Ok(()),
            other => Err(unexpected(name, other)),
        }
    }
}

fn unexpected(request: &'static str, got: Response) -> LinkError {
    LinkError::UnexpectedResponse {
        request,
        got: got.variant_name(),
    }
}
