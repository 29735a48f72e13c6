//! Realtime client tests against a local feed server over real sockets.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use common::{accident, wait_until, FeedServer, Frame};
use crashalert_client::{keep_in_sync, CloseReason, ReconnectConfig};
use crashalert_core::accident::AccidentStatus;
use crashalert_core::realtime::{ActiveAccidents, ServerMessage};
use tokio_util::sync::CancellationToken;

fn fast_reconnect() -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        multiplier: 2.0,
    }
}

fn new_accident(id: i64) -> Frame {
    Frame::Message(ServerMessage::NewAccident(accident(id, AccidentStatus::Active)))
}

fn accident_update(id: i64, status: AccidentStatus) -> Frame {
    Frame::Message(ServerMessage::AccidentUpdate(accident(id, status)))
}

fn force_logout() -> Frame {
    Frame::Message(ServerMessage::ForceLogout {
        message: "Logged in from another device".into(),
    })
}

/// Run `keep_in_sync` on its own task against `server`.
fn spawn_sync(
    server: &FeedServer,
    active: Arc<Mutex<ActiveAccidents>>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<Result<Option<CloseReason>, crashalert_client::ClientError>> {
    let client = server.client();
    tokio::spawn(async move { keep_in_sync(&client, active, &fast_reconnect(), &cancel).await })
}

// ---------------------------------------------------------------------------
// AlertConnection::run
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_dispatches_frames_until_server_close() {
    let server = FeedServer::start(
        vec![vec![
            new_accident(1),
            Frame::Raw("not a realtime frame"),
            Frame::Raw(r#"{"event":"camera_offline","data":{}}"#),
            accident_update(1, AccidentStatus::Assigned),
            Frame::Close,
        ]],
        Some(vec![]),
    )
    .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let on_new = Arc::clone(&seen);
    let on_update = Arc::clone(&seen);

    let mut conn = server.client().connect().await.unwrap();
    conn.on_new_accident(move |a| on_new.lock().unwrap().push(format!("new:{}", a.id)))
        .on_accident_update(move |a| {
            on_update.lock().unwrap().push(format!("update:{}:{:?}", a.id, a.status))
        });

    let reason = conn.run().await;

    assert_matches!(reason, Ok(CloseReason::ServerClosed));
    assert_eq!(*seen.lock().unwrap(), vec!["new:1", "update:1:Assigned"]);
}

#[tokio::test]
async fn force_logout_stops_run_before_later_frames() {
    let server = FeedServer::start(vec![vec![force_logout(), new_accident(2)]], Some(vec![])).await;

    let messages = Arc::new(Mutex::new(Vec::new()));
    let new_seen = Arc::new(Mutex::new(0usize));
    let on_logout = Arc::clone(&messages);
    let on_new = Arc::clone(&new_seen);

    let mut conn = server.client().connect().await.unwrap();
    conn.on_force_logout(move |message| on_logout.lock().unwrap().push(message))
        .on_new_accident(move |_| *on_new.lock().unwrap() += 1);

    let reason = conn.run().await;

    assert_matches!(reason, Ok(CloseReason::ForcedLogout));
    assert_eq!(*messages.lock().unwrap(), vec!["Logged in from another device"]);
    assert_eq!(*new_seen.lock().unwrap(), 0);
}

#[tokio::test]
async fn frames_without_handlers_are_dropped() {
    let server = FeedServer::start(vec![vec![new_accident(3), Frame::Close]], Some(vec![])).await;

    let conn = server.client().connect().await.unwrap();

    assert_matches!(conn.run().await, Ok(CloseReason::ServerClosed));
}

// ---------------------------------------------------------------------------
// keep_in_sync
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sync_seeds_from_rest_then_merges_frames() {
    let server = FeedServer::start(
        vec![vec![new_accident(2), accident_update(1, AccidentStatus::Handled)]],
        Some(vec![
            accident(1, AccidentStatus::Active),
            accident(9, AccidentStatus::Handled),
        ]),
    )
    .await;
    let active = Arc::new(Mutex::new(ActiveAccidents::new()));
    let cancel = CancellationToken::new();
    let handle = spawn_sync(&server, Arc::clone(&active), cancel.clone());

    wait_until(|| {
        let list = active.lock().unwrap();
        list.get(2).is_some() && list.get(1).is_none()
    })
    .await;

    assert_eq!(active.lock().unwrap().len(), 1);
    assert_eq!(server.fetches(), 1);
    cancel.cancel();
    assert_matches!(handle.await.unwrap(), Ok(None));
}

#[tokio::test]
async fn sync_reconnects_and_refetches_after_server_close() {
    let server = FeedServer::start(
        vec![vec![Frame::Close], vec![new_accident(6)]],
        Some(vec![accident(1, AccidentStatus::Active)]),
    )
    .await;
    let active = Arc::new(Mutex::new(ActiveAccidents::new()));
    let cancel = CancellationToken::new();
    let handle = spawn_sync(&server, Arc::clone(&active), cancel.clone());

    wait_until(|| active.lock().unwrap().get(6).is_some()).await;

    assert_eq!(server.ws_connects(), 2);
    assert_eq!(server.fetches(), 2);
    assert!(active.lock().unwrap().get(1).is_some());
    cancel.cancel();
    assert_matches!(handle.await.unwrap(), Ok(None));
}

#[tokio::test]
async fn failed_refetch_keeps_list_and_feed_running() {
    let server = FeedServer::start(vec![vec![new_accident(7)]], None).await;
    let active = Arc::new(Mutex::new(ActiveAccidents::from_list(vec![accident(
        1,
        AccidentStatus::Active,
    )])));
    let cancel = CancellationToken::new();
    let handle = spawn_sync(&server, Arc::clone(&active), cancel.clone());

    wait_until(|| active.lock().unwrap().get(7).is_some()).await;

    // The stale entry survives the failed refetch.
    assert!(active.lock().unwrap().get(1).is_some());
    assert_eq!(server.fetches(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!handle.is_finished());
    assert_eq!(server.ws_connects(), 1);

    cancel.cancel();
    assert_matches!(handle.await.unwrap(), Ok(None));
}

#[tokio::test]
async fn forced_logout_ends_sync_without_reconnecting() {
    let server = FeedServer::start(vec![vec![force_logout()]], Some(vec![])).await;
    let active = Arc::new(Mutex::new(ActiveAccidents::new()));
    let handle = spawn_sync(&server, active, CancellationToken::new());

    let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap();

    assert_matches!(result.unwrap(), Ok(Some(CloseReason::ForcedLogout)));
    assert_eq!(server.ws_connects(), 1);
}
