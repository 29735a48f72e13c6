pub mod accidents;
pub mod auth;
pub mod cameras;
pub mod health;
pub mod internal;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws?token=<jwt>                                  WebSocket (auth before upgrade)
///
/// /auth/login                                      login (public)
/// /auth/refresh                                    rotate the session token (requires auth)
/// /auth/logout                                     logout (requires auth)
/// /auth/register                                   register (admin only)
/// /auth/logs                                       auth log viewer (admin only)
///
/// /users/get-all-users                             list users (admin only)
/// /users/get-role                                  caller's role
///
/// /accidents/active-accidents                      open accidents
/// /accidents/handled-accidents                     handled accidents (filterable)
/// /accidents/mark-as-handled                       POST
/// /accidents/update-accident-details               POST
/// /accidents/accident-status-update                POST
///
/// /statistics                                      aggregates (filterable)
///
/// /cameras/get-cameras                             cameras with accident ids
/// /cameras/get-id_location                         id/location pairs
/// /cameras/assign-cameras                          POST (admin only)
/// /cameras/add-camera                              POST (admin only)
///
/// /internal/accidents                              POST detection (shared secret)
/// /internal/cameras                                camera list (shared secret)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/accidents", accidents::router())
        .route("/statistics", get(handlers::statistics::get_statistics))
        .nest("/cameras", cameras::router())
        // Detection service ingestion.
        .nest("/internal", internal::router())
}
