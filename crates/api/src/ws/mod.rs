//! WebSocket infrastructure for realtime accident alerts.
//!
//! Provides connection management, heartbeat pings, the event-bus fan-out,
//! and the authenticated HTTP upgrade handler.

mod fanout;
mod handler;
mod heartbeat;
pub mod manager;

pub use fanout::FanOut;
pub use handler::ws_handler;
pub use heartbeat::{start_heartbeat, HEARTBEAT_INTERVAL};
pub use manager::WsManager;
