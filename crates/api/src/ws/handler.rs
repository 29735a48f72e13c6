use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::response::IntoResponse;
use crashalert_core::error::CoreError;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::ws::manager::WsManager;

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Authenticated user of a realtime connection.
///
/// Browsers cannot set headers on a WebSocket handshake, so the token is
/// read from `?token=` first and from a Bearer header otherwise.
pub struct WsAuth(pub AuthUser);

impl FromRequestParts<AppState> for WsAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let from_query = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token)
            .filter(|t| !t.is_empty());

        match from_query {
            Some(token) => AuthUser::from_token(&token, state).await.map(WsAuth),
            None if parts.headers.contains_key("authorization") => {
                AuthUser::from_request_parts(parts, state).await.map(WsAuth)
            }
            None => Err(AppError::Core(CoreError::Unauthorized(
                "Missing access token".into(),
            ))),
        }
    }
}

/// HTTP handler that upgrades an authenticated request to WebSocket.
///
/// Authentication runs before the upgrade, so a bad token gets a plain 401.
pub async fn ws_handler(
    WsAuth(user): WsAuth,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, user))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Outbound frames come from the `WsManager` channel through a sender task;
/// inbound frames are only inspected for Close and Pong.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, user: AuthUser) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id = user.user_id, "WebSocket connected");

    let mut rx = ws_manager
        .add(conn_id.clone(), user.user_id, user.session_id.clone())
        .await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, user_id = user.user_id, "WebSocket disconnected");
}
