//! Keep-alive pings for idle alert sockets.
//!
//! Dashboards can sit for a long time between accidents; the pings stop
//! proxies from reaping those quiet connections.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::ws::manager::WsManager;

/// Default period between pings.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Ping every open alert socket once per `period`.
///
/// Rounds with no connections are skipped. `main` aborts the returned
/// handle after the shutdown cleanup has closed the remaining sockets.
pub fn start_heartbeat(ws_manager: Arc<WsManager>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let count = ws_manager.connection_count().await;
            if count == 0 {
                continue;
            }
            tracing::trace!(count, "Pinging alert sockets");
            ws_manager.ping_all().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use axum::extract::ws::Message;

    use super::*;

    #[tokio::test]
    async fn pings_open_sockets_until_aborted() {
        let manager = Arc::new(WsManager::new());
        let mut rx = manager.add("dash".to_string(), 1, "jti-1".into()).await;

        let handle = start_heartbeat(Arc::clone(&manager), Duration::from_millis(20));

        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(frame, Ok(Some(Message::Ping(_)))));

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
