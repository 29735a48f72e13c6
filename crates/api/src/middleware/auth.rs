//! JWT-based authentication extractor for Axum handlers.
//!
//! A token is honoured when its signature and expiry check out and its
//! `jti` names a live row in `user_sessions`. Logout, refresh and
//! single-session logins revoke rows, which ends the token early.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use crashalert_core::error::CoreError;
use crashalert_core::types::DbId;
use crashalert_db::models::session::UserSession;
use crashalert_db::repositories::SessionRepo;

use crate::auth::jwt::{validate_token, Claims};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    pub username: String,
    /// The user's role name (`"admin"` or `"user"`).
    pub role: String,
    /// Token id; keys the session row and the auth log entry.
    pub session_id: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
            session_id: claims.jti,
        }
    }
}

impl AuthUser {
    /// Validate a raw token and confirm its session is still live.
    pub async fn from_token(token: &str, state: &AppState) -> Result<Self, AppError> {
        let user = Self::from_signed_token(token, state)?;
        user.ensure_live_session(state).await?;
        Ok(user)
    }

    /// Signature and expiry only. Callers must follow up with
    /// [`ensure_live_session`](Self::ensure_live_session).
    pub(crate) fn from_signed_token(token: &str, state: &AppState) -> Result<Self, AppError> {
        validate_token(token, &state.config.jwt)
            .map(AuthUser::from)
            .map_err(|_| {
                AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
            })
    }

    /// Reject tokens whose session was revoked or has lapsed.
    pub(crate) async fn ensure_live_session(&self, state: &AppState) -> Result<(), AppError> {
        let session = SessionRepo::touch_active(&state.pool, &self.session_id).await?;
        check_session(self, session.as_ref())
    }
}

/// The session must exist and belong to the token's subject.
fn check_session(user: &AuthUser, session: Option<&UserSession>) -> Result<(), AppError> {
    match session {
        Some(session) if session.user_id == user.user_id => Ok(()),
        _ => {
            tracing::debug!(
                user_id = user.user_id,
                session_id = %user.session_id,
                "Rejected token without a live session"
            );
            Err(AppError::Core(CoreError::Unauthorized(
                "Session has ended, please log in again".into(),
            )))
        }
    }
}

/// The token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        AuthUser::from_token(token, state).await
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    fn user(user_id: DbId) -> AuthUser {
        AuthUser {
            user_id,
            username: "lee".into(),
            role: "user".into(),
            session_id: "jti-1".into(),
        }
    }

    fn session(user_id: DbId) -> UserSession {
        let now = Utc::now();
        UserSession {
            id: 1,
            user_id,
            jti: "jti-1".into(),
            expires_at: now + Duration::minutes(15),
            is_revoked: false,
            user_agent: None,
            ip_address: None,
            last_active_at: now,
            created_at: now,
        }
    }

    #[test]
    fn live_session_of_the_same_user_is_accepted() {
        assert!(check_session(&user(7), Some(&session(7))).is_ok());
    }

    #[test]
    fn missing_session_is_unauthorized() {
        assert_matches!(
            check_session(&user(7), None),
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );
    }

    #[test]
    fn session_of_another_user_is_unauthorized() {
        assert_matches!(
            check_session(&user(7), Some(&session(8))),
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );
    }

    #[test]
    fn bearer_token_requires_the_bearer_scheme() {
        let (mut parts, _) = axum::http::Request::builder()
            .header("authorization", "Basic abc")
            .body(())
            .unwrap()
            .into_parts();
        assert_matches!(
            bearer_token(&parts),
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );

        parts
            .headers
            .insert("authorization", "Bearer tok".parse().unwrap());
        assert_eq!(bearer_token(&parts).unwrap(), "tok");
    }
}
