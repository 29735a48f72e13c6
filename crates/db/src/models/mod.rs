//! Row models and DTOs, one module per table.

pub mod accident;
pub mod auth_log;
pub mod camera;
pub mod session;
pub mod user;
