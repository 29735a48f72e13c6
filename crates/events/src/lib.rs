//! CrashAlert in-process event bus.
//!
//! - [`EventBus`]: publish/subscribe hub backed by `tokio::sync::broadcast`.
//! - [`AccidentEvent`]: a created or updated accident, as published by the
//!   ingestion and responder paths and consumed by the realtime fan-out.

pub mod bus;

pub use bus::{AccidentEvent, AccidentEventKind, EventBus};
