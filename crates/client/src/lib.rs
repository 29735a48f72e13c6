//! Rust client for the CrashAlert realtime feed and REST API.
//!
//! Connecting is two-phase: [`AlertClient::connect`] opens the socket and
//! returns an [`AlertConnection`]; handlers are registered on it before
//! [`AlertConnection::run`] starts dispatching. After a drop, reconnect with
//! [`reconnect_loop`] and refetch the active list with
//! [`AlertClient::fetch_active_accidents`], or let [`keep_in_sync`] do both.

pub mod api;
pub mod client;
pub mod connection;
pub mod error;
pub mod reconnect;
pub mod sync;

pub use client::AlertClient;
pub use connection::{AlertConnection, CloseReason, Handlers};
pub use error::ClientError;
pub use reconnect::{next_delay, reconnect_loop, ReconnectConfig};
pub use sync::keep_in_sync;
