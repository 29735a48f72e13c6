use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use crashalert_core::realtime::ServerMessage;
use crashalert_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Authenticated user owning this connection.
    pub user_id: DbId,
    /// Login session (token `jti`) the connection was opened with.
    pub session_id: String,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Manages all active WebSocket connections.
///
/// Thread-safe via interior `RwLock`; wrapped in `Arc` and shared through
/// [`AppState`](crate::state::AppState).
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

/// Encode a realtime message as a text frame.
pub fn text_frame(message: &ServerMessage) -> Result<Message, serde_json::Error> {
    let json = serde_json::to_string(message)?;
    Ok(Message::Text(json.into()))
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: DbId,
        session_id: String,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            session_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID. Unknown IDs are ignored.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// All connection IDs owned by `user_id`.
    pub async fn get_by_user(&self, user_id: DbId) -> Vec<String> {
        self.connections
            .read()
            .await
            .iter()
            .filter(|(_, conn)| conn.user_id == user_id)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Broadcast a message to every connection.
    ///
    /// Returns how many connections accepted it. Connections whose channels
    /// are closed are skipped; their receive loop removes them.
    pub async fn broadcast(&self, message: Message) -> usize {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Send a message to all connections belonging to `user_id`.
    ///
    /// Returns the number of connections the message was sent to.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> usize {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|conn| conn.user_id == user_id)
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Disconnect every connection of `user_id`.
    ///
    /// Each connection receives `farewell` (if any) followed by a Close
    /// frame, and is dropped from the manager. Returns how many were closed.
    pub async fn close_user(&self, user_id: DbId, farewell: Option<Message>) -> usize {
        let closed = self.close_where(|conn| conn.user_id == user_id, farewell).await;
        if closed > 0 {
            tracing::info!(user_id, count = closed, "Closed user WebSocket connections");
        }
        closed
    }

    /// Disconnect the connections opened with one login session.
    pub async fn close_session(&self, session_id: &str, farewell: Option<Message>) -> usize {
        let closed = self.close_where(|conn| conn.session_id == session_id, farewell).await;
        if closed > 0 {
            tracing::info!(session_id, count = closed, "Closed session WebSocket connections");
        }
        closed
    }

    async fn close_where(
        &self,
        matches: impl Fn(&WsConnection) -> bool,
        farewell: Option<Message>,
    ) -> usize {
        let mut conns = self.connections.write().await;
        let ids: Vec<String> = conns
            .iter()
            .filter(|(_, conn)| matches(conn))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &ids {
            if let Some(conn) = conns.remove(id) {
                if let Some(msg) = &farewell {
                    let _ = conn.sender.send(msg.clone());
                }
                let _ = conn.sender.send(Message::Close(None));
            }
        }
        ids.len()
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
