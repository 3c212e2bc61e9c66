use std::sync::atomic::{AtomicI64, Ordering};

use tokio::time::timeout;
use uuid::Uuid;

use super::*;
use crate::config::CoreConfig;
use crate::doc::{ObjectKind, SpatialObject};
use crate::geom::Rect;
use crate::wire::RemoteUpdate;

fn shared_engine() -> SharedEngine {
    let mut engine = Engine::new(Uuid::from_u128(1000), CoreConfig::default());
    engine.apply_create(SpatialObject::new(Uuid::from_u128(1), ObjectKind::Note, Rect::new(0.0, 0.0, 40.0, 40.0)));
    Arc::new(Mutex::new(engine))
}

#[tokio::test]
async fn forward_sends_in_order() {
    let (tx, mut rx) = mpsc::channel(8);
    let sent = forward(vec![Action::RenderNeeded, Action::ObjectDeleted { id: Uuid::from_u128(1) }], &tx)
        .await
        .unwrap();
    assert_eq!(sent, 2);
    assert_eq!(rx.recv().await, Some(Action::RenderNeeded));
    assert_eq!(rx.recv().await, Some(Action::ObjectDeleted { id: Uuid::from_u128(1) }));
}

#[tokio::test]
async fn forward_reports_closed_channel() {
    let (tx, rx) = mpsc::channel(8);
    drop(rx);
    let result = forward(vec![Action::RenderNeeded], &tx).await;
    assert!(matches!(result, Err(BridgeError::Closed)));
}

#[tokio::test]
async fn forward_empty_batch_is_ok() {
    let (tx, _rx) = mpsc::channel(8);
    assert_eq!(forward(Vec::new(), &tx).await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn ticker_forwards_stale_gc() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let engine = shared_engine();
    engine
        .lock()
        .await
        .on_remote_position(&RemoteUpdate::position(Uuid::from_u128(2000), Uuid::from_u128(1), 9.0, 9.0), 0);

    let clock = Arc::new(AtomicI64::new(0));
    let ticker_clock = Arc::clone(&clock);
    let (tx, mut rx) = mpsc::channel(8);
    let handle = spawn_ticker(Arc::clone(&engine), tx, Duration::from_millis(50), move || {
        ticker_clock.load(Ordering::SeqCst)
    });

    clock.store(6000, Ordering::SeqCst);
    let action = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("ticker produced nothing")
        .expect("channel closed");
    assert_eq!(action, Action::RenderNeeded);
    assert!(engine.lock().await.remote().is_empty());

    drop(rx);
    timeout(Duration::from_secs(1), handle)
        .await
        .expect("ticker did not stop")
        .unwrap();
}

#[test]
fn wall_clock_is_after_2020() {
    assert!(wall_clock_ms() > 1_577_836_800_000);
}
