//! Request handlers, one submodule per resource.
//!
//! Handlers delegate to the repositories in `crashalert_db`, publish accident
//! changes on the event bus, and map errors via [`AppError`](crate::error::AppError).

pub mod accidents;
pub mod auth;
pub mod cameras;
pub mod internal;
pub mod statistics;
pub mod users;
