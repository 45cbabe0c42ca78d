//! RPC facade behavior: typed wrappers, response validation, bind/unbind
//! lifecycle.

mod common;

use std::sync::{Arc, Mutex};

use common::{FakeDevice, RecordingConnector};
use ferry_link::proto::{Frame, FrameContent, Response};
use ferry_link::{LinkError, Rpc, TransportEvent};

fn rpc() -> Rpc {
    Rpc::new(Arc::new(RecordingConnector::new()))
}

async fn bound_rpc() -> (Rpc, Arc<Mutex<FakeDevice>>) {
    let rpc = rpc();
    let (binding, harness) = common::binding();
    let device = Arc::new(Mutex::new(FakeDevice::default()));
    common::serve(device.clone(), harness);
    rpc.bind("flip0".into(), binding).await;
    (rpc, device)
}

#[tokio::test]
async fn calls_while_unbound_fail() {
    let rpc = rpc();
    assert!(matches!(
        rpc.ping(vec![1]).await,
        Err(LinkError::NotConnected)
    ));
}

#[tokio::test]
async fn ping_echoes_payload() {
    let (rpc, _) = bound_rpc().await;
    let bytes = rpc.ping(vec![1, 2, 3]).await.unwrap();
    assert_eq!(bytes, vec![1, 2, 3]);
}

#[tokio::test]
async fn storage_operations_roundtrip() {
    let (rpc, device) = bound_rpc().await;

    rpc.write("/ext/archive/note.txt", b"hello".to_vec())
        .await
        .unwrap();
    assert_eq!(
        device.lock().unwrap().storage.get("/ext/archive/note.txt"),
        Some(&b"hello".to_vec())
    );

    let bytes = rpc.read("/ext/archive/note.txt").await.unwrap();
    assert_eq!(bytes, b"hello");

    let hash = rpc.hash("/ext/archive/note.txt").await.unwrap();
    assert_eq!(hash, common::toy_hash(b"hello"));

    let entries = rpc.list("/ext/archive").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "note.txt");
    assert_eq!(entries[0].size, 5);

    rpc.delete("/ext/archive/note.txt", false).await.unwrap();
    assert!(device.lock().unwrap().storage.is_empty());
}

#[tokio::test]
async fn device_error_surfaces_as_device_failure() {
    let (rpc, _) = bound_rpc().await;
    let err = rpc.read("/ext/archive/missing.txt").await.unwrap_err();
    assert!(matches!(err, LinkError::Device(_)));
}

#[tokio::test]
async fn mismatched_variant_is_a_protocol_error() {
    let rpc = rpc();
    let (binding, mut harness) = common::binding();
    rpc.bind("flip0".into(), binding).await;

    // Responder that answers everything with a bare Ok.
    tokio::spawn(async move {
        while let Some(frame) = harness.sent.recv().await {
            if matches!(frame.content, FrameContent::Request(_)) {
                let _ = harness
                    .inbound
                    .send(TransportEvent::Frame(Frame::response(frame.id, Response::Ok)));
            }
        }
    });

    let err = rpc.ping(vec![1]).await.unwrap_err();
    assert!(matches!(
        err,
        LinkError::UnexpectedResponse {
            request: "ping",
            got: "ok"
        }
    ));
}

#[tokio::test]
async fn rebind_invalidates_previous_session() {
    let rpc = Arc::new(rpc());
    let (binding_a, mut harness_a) = common::binding();
    rpc.bind("flip0".into(), binding_a).await;

    // Leave a request hanging on the first session.
    let pending = {
        let rpc = rpc.clone();
        tokio::spawn(async move { rpc.ping(vec![1]).await })
    };
    harness_a.sent.recv().await.unwrap();

    let (binding_b, harness_b) = common::binding();
    let device = Arc::new(Mutex::new(FakeDevice::default()));
    common::serve(device, harness_b);
    rpc.bind("flip1".into(), binding_b).await;

    assert!(matches!(
        pending.await.unwrap(),
        Err(LinkError::SessionInvalidated)
    ));

    // The new session serves calls normally.
    assert_eq!(rpc.ping(vec![9]).await.unwrap(), vec![9]);
}

#[tokio::test]
async fn unbind_returns_to_unbound_state() {
    let (rpc, _) = bound_rpc().await;
    assert!(rpc.is_bound().await);

    rpc.unbind().await;
    assert!(!rpc.is_bound().await);
    assert!(matches!(
        rpc.ping(vec![1]).await,
        Err(LinkError::NotConnected)
    ));
}

#[tokio::test]
async fn system_and_gui_commands_complete() {
    let (rpc, _) = bound_rpc().await;

    rpc.alert().await.unwrap();
    rpc.screen_stream(true).await.unwrap();
    rpc.send_button(
        ferry_link::proto::InputKey::Ok,
        ferry_link::proto::InputPhase::Short,
    )
    .await
    .unwrap();
    rpc.virtual_display(false).await.unwrap();
}
