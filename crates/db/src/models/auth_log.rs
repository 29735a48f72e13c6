//! Auth log entity model, insert DTO, and query parameters.
//!
//! Auth logs are append-only; there is no update path.

use crashalert_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuthLog {
    pub id: DbId,
    pub username: String,
    pub action: String,
    pub result: String,
    pub occurred_at: Timestamp,
    pub display_date: Option<String>,
    pub display_time: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub browser: Option<String>,
    pub operating_system: Option<String>,
    pub error_message: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateAuthLog {
    pub username: String,
    pub action: String,
    pub result: String,
    pub display_date: Option<String>,
    pub display_time: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub browser: Option<String>,
    pub operating_system: Option<String>,
    pub error_message: Option<String>,
    pub session_id: Option<String>,
}

/// Filter and pagination for the admin log viewer.
#[derive(Debug, Clone, Default)]
pub struct AuthLogQuery {
    /// Case-insensitive substring match on `username`.
    pub username: Option<String>,
    pub action: Option<String>,
    pub result: Option<String>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: i64,
    pub offset: i64,
}
