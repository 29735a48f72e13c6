//! Event-bus to WebSocket fan-out.
//!
//! [`FanOut`] subscribes to the accident event bus and pushes each event as
//! a `new_accident` / `accident_update` frame to every connected client.

use std::sync::Arc;

use crashalert_events::AccidentEvent;
use tokio::sync::broadcast;

use crate::ws::manager::{text_frame, WsManager};

pub struct FanOut {
    ws_manager: Arc<WsManager>,
}

impl FanOut {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run until the event bus is dropped.
    ///
    /// Lagging is logged and skipped; clients recover by refetching the
    /// active list.
    pub async fn run(self, mut receiver: broadcast::Receiver<AccidentEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.deliver(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Realtime fan-out lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, realtime fan-out shutting down");
                    break;
                }
            }
        }
    }

    async fn deliver(&self, event: &AccidentEvent) {
        let message = event.to_message();
        match text_frame(&message) {
            Ok(frame) => {
                let delivered = self.ws_manager.broadcast(frame).await;
                tracing::debug!(
                    event = message.event_name(),
                    accident_id = event.accident.id,
                    delivered,
                    "Fanned out accident event"
                );
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    accident_id = event.accident.id,
                    "Failed to encode realtime message"
                );
            }
        }
    }
}
