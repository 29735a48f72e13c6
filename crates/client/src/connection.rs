//! A live realtime connection and its per-event handlers.

use crashalert_core::accident::Accident;
use crashalert_core::realtime::ServerMessage;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::ClientError;

type AccidentHandler = Box<dyn FnMut(Accident) + Send + 'static>;
type LogoutHandler = Box<dyn FnMut(String) + Send + 'static>;

/// Why [`AlertConnection::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The session was superseded by a newer login. Do not reconnect.
    ForcedLogout,
    /// The server sent a Close frame.
    ServerClosed,
    /// The stream ended without a Close frame.
    StreamEnded,
}

/// One handler slot per event kind. Registering again replaces the slot.
#[derive(Default)]
pub struct Handlers {
    new_accident: Option<AccidentHandler>,
    accident_update: Option<AccidentHandler>,
    force_logout: Option<LogoutHandler>,
}

impl Handlers {
    pub fn on_new_accident(&mut self, handler: impl FnMut(Accident) + Send + 'static) {
        self.new_accident = Some(Box::new(handler));
    }

    pub fn on_accident_update(&mut self, handler: impl FnMut(Accident) + Send + 'static) {
        self.accident_update = Some(Box::new(handler));
    }

    pub fn on_force_logout(&mut self, handler: impl FnMut(String) + Send + 'static) {
        self.force_logout = Some(Box::new(handler));
    }

    /// Route one message to its handler. Events without a handler are dropped.
    pub fn dispatch(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::NewAccident(accident) => {
                if let Some(handler) = self.new_accident.as_mut() {
                    handler(accident);
                }
            }
            ServerMessage::AccidentUpdate(accident) => {
                if let Some(handler) = self.accident_update.as_mut() {
                    handler(accident);
                }
            }
            ServerMessage::ForceLogout { message } => {
                if let Some(handler) = self.force_logout.as_mut() {
                    handler(message);
                }
            }
        }
    }
}

/// A live WebSocket connection to the realtime feed.
pub struct AlertConnection {
    ws_stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    handlers: Handlers,
}

impl AlertConnection {
    pub(crate) fn new(ws_stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>) -> Self {
        Self {
            ws_stream,
            handlers: Handlers::default(),
        }
    }

    pub fn on_new_accident(&mut self, handler: impl FnMut(Accident) + Send + 'static) -> &mut Self {
        self.handlers.on_new_accident(handler);
        self
    }

    pub fn on_accident_update(
        &mut self,
        handler: impl FnMut(Accident) + Send + 'static,
    ) -> &mut Self {
        self.handlers.on_accident_update(handler);
        self
    }

    pub fn on_force_logout(&mut self, handler: impl FnMut(String) + Send + 'static) -> &mut Self {
        self.handlers.on_force_logout(handler);
        self
    }

    /// Dispatch frames to the registered handlers until the connection ends.
    ///
    /// Frames that fail to decode are logged and skipped.
    pub async fn run(mut self) -> Result<CloseReason, ClientError> {
        while let Some(frame) = self.ws_stream.next().await {
            let frame = frame.map_err(|e| ClientError::Protocol(e.to_string()))?;

            match frame {
                Message::Text(text) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(message) => {
                        let forced = matches!(message, ServerMessage::ForceLogout { .. });
                        tracing::debug!(event = message.event_name(), "Realtime frame received");
                        self.handlers.dispatch(message);
                        if forced {
                            return Ok(CloseReason::ForcedLogout);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping undecodable realtime frame");
                    }
                },
                Message::Close(frame) => {
                    tracing::info!(?frame, "Realtime feed closed by server");
                    return Ok(CloseReason::ServerClosed);
                }
                // Pongs are answered by tungstenite itself.
                _ => {}
            }
        }
        Ok(CloseReason::StreamEnded)
    }
}
