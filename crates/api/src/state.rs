use std::sync::Arc;

use crashalert_events::EventBus;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything inside is an `Arc` or a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: crashalert_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Realtime connections of logged-in clients.
    pub ws_manager: Arc<WsManager>,
    /// Accident change events, consumed by the realtime fan-out.
    pub event_bus: Arc<EventBus>,
}
