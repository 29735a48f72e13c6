#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use crashalert_client::AlertClient;
use crashalert_core::accident::{Accident, AccidentStatus, Severity};
use crashalert_core::realtime::ServerMessage;
use serde_json::json;

/// One scripted step on a realtime socket.
#[derive(Debug, Clone)]
pub enum Frame {
    Message(ServerMessage),
    Raw(&'static str),
    Close,
}

#[derive(Clone)]
struct FeedState {
    scripts: Arc<Vec<Vec<Frame>>>,
    active: Option<Vec<Accident>>,
    ws_connects: Arc<AtomicUsize>,
    fetches: Arc<AtomicUsize>,
}

/// A local stand-in for the CrashAlert server.
///
/// The n-th WebSocket connection plays `scripts[n]` and then stays open
/// until the client hangs up (or closes at once when the script ends with
/// [`Frame::Close`]). `GET /accidents/active-accidents` answers with
/// `active`, or with a 500 envelope when it is `None`.
pub struct FeedServer {
    pub base_url: String,
    ws_connects: Arc<AtomicUsize>,
    fetches: Arc<AtomicUsize>,
}

impl FeedServer {
    pub async fn start(scripts: Vec<Vec<Frame>>, active: Option<Vec<Accident>>) -> Self {
        let state = FeedState {
            scripts: Arc::new(scripts),
            active,
            ws_connects: Arc::new(AtomicUsize::new(0)),
            fetches: Arc::new(AtomicUsize::new(0)),
        };
        let ws_connects = Arc::clone(&state.ws_connects);
        let fetches = Arc::clone(&state.fetches);

        let app = Router::new()
            .route("/api/v1/ws", get(ws_upgrade))
            .route("/api/v1/accidents/active-accidents", get(active_accidents))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            ws_connects,
            fetches,
        }
    }

    pub fn client(&self) -> AlertClient {
        AlertClient::new(&self.base_url, "test-token")
    }

    pub fn ws_connects(&self) -> usize {
        self.ws_connects.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

async fn ws_upgrade(State(state): State<FeedState>, ws: WebSocketUpgrade) -> Response {
    let n = state.ws_connects.fetch_add(1, Ordering::SeqCst);
    let script = state.scripts.get(n).cloned().unwrap_or_default();
    ws.on_upgrade(move |socket| play(socket, script))
}

async fn play(mut socket: WebSocket, script: Vec<Frame>) {
    for frame in script {
        let msg = match frame {
            Frame::Message(message) => {
                Message::Text(serde_json::to_string(&message).unwrap().into())
            }
            Frame::Raw(text) => Message::Text(text.into()),
            Frame::Close => {
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
        };
        if socket.send(msg).await.is_err() {
            return;
        }
    }
    while let Some(Ok(_)) = socket.recv().await {}
}

async fn active_accidents(State(state): State<FeedState>) -> Response {
    state.fetches.fetch_add(1, Ordering::SeqCst);
    match state.active {
        Some(list) => Json(json!({ "success": true, "data": list })).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "message": "Database unavailable",
                "code": "INTERNAL_ERROR",
            })),
        )
            .into_response(),
    }
}

pub fn accident(id: i64, status: AccidentStatus) -> Accident {
    Accident {
        id,
        camera_id: "cam-1".into(),
        location: "Main Road".into(),
        occurred_at: "2025-03-01T08:15:00Z".parse().unwrap(),
        display_date: None,
        display_time: None,
        severity: Severity::High,
        status,
        assigned_to: None,
        false_positive: false,
        description: None,
        video: None,
    }
}

/// Poll `condition` every 10 ms; panic if it is still false after 5 s.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let polled = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "condition not met within 5s");
}
