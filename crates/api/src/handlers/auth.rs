//! Handlers for the `/auth` resource (login, refresh, logout, register, logs).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use crashalert_core::auth_log::{
    browser_family, is_valid_action, is_valid_result, operating_system, ACTION_LOGIN,
    ACTION_LOGOUT, ACTION_REGISTER, RESULT_FAILURE, RESULT_SUCCESS,
};
use crashalert_core::error::CoreError;
use crashalert_core::realtime::ServerMessage;
use crashalert_core::roles::{is_valid_role, ROLE_USER};
use crashalert_core::types::DbId;
use crashalert_db::models::auth_log::{AuthLog, AuthLogQuery, CreateAuthLog};
use crashalert_db::models::session::CreateSession;
use crashalert_db::models::user::{CreateUser, User};
use crashalert_db::repositories::auth_log_repo::MAX_PAGE_SIZE;
use crashalert_db::repositories::{AuthLogRepo, SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, Claims};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientMeta;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{ApiResponse, Page};
use crate::state::AppState;
use crate::ws::manager::text_frame;

/// Sent to a user's older connections when a single-session account logs in again.
const FORCE_LOGOUT_MESSAGE: &str = "You have been logged in from another device";

const DEFAULT_LOG_PAGE_SIZE: i64 = 20;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    pub password: String,
    /// Defaults to `user`.
    pub role: Option<String>,
}

/// Successful login or refresh response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in auth responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: String,
}

/// Query parameters for `GET /auth/logs`.
///
/// Dates are `YYYY-MM-DD` in the display clock; unparsable dates are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct AuthLogParams {
    pub username: Option<String>,
    pub action: Option<String>,
    pub result: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with username + password. Every attempt is written to the
/// auth log. For single-session accounts, earlier sessions are revoked and
/// older realtime connections get a `force_logout` frame and are closed.
pub async fn login(
    State(state): State<AppState>,
    meta: ClientMeta,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let invalid = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        ))
    };

    let Some(user) = UserRepo::find_by_username(&state.pool, &input.username).await? else {
        record_auth_event(
            &state,
            &meta,
            AuthEvent::failure(&input.username, ACTION_LOGIN, "Unknown username"),
        )
        .await;
        return Err(invalid());
    };

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        record_auth_event(
            &state,
            &meta,
            AuthEvent::failure(&user.username, ACTION_LOGIN, "Wrong password"),
        )
        .await;
        return Err(invalid());
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;

    if user.single_session_only {
        let revoked = SessionRepo::revoke_all_for_user(&state.pool, user.id).await?;
        let farewell = text_frame(&ServerMessage::ForceLogout {
            message: FORCE_LOGOUT_MESSAGE.to_string(),
        })
        .map_err(|e| AppError::InternalError(format!("Message encoding error: {e}")))?;
        let closed = state.ws_manager.close_user(user.id, Some(farewell)).await;
        if revoked > 0 || closed > 0 {
            tracing::info!(user_id = user.id, revoked, closed, "Superseded earlier sessions");
        }
    }

    let (access_token, claims) = issue_session(&state, &user, &meta).await?;

    let mut event = AuthEvent::success(&user.username, ACTION_LOGIN);
    event.session_id = Some(claims.jti);
    record_auth_event(&state, &meta, event).await;

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(Json(ApiResponse::ok(login_response(&state, access_token, user))))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a live access token for a fresh one. The old session is
/// revoked, so each token can be refreshed once.
pub async fn refresh(
    State(state): State<AppState>,
    auth_user: AuthUser,
    meta: ClientMeta,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !SessionRepo::revoke_by_jti(&state.pool, &auth_user.session_id).await? {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Session has ended, please log in again".into(),
        )));
    }

    let (access_token, claims) = issue_session(&state, &user, &meta).await?;

    tracing::info!(
        user_id = user.id,
        old_session = %auth_user.session_id,
        new_session = %claims.jti,
        "Session refreshed"
    );

    Ok(Json(ApiResponse::ok(login_response(&state, access_token, user))))
}

/// POST /api/v1/auth/logout
///
/// End the caller's session: its token stops working and the realtime
/// connections opened with it are closed. Other devices stay signed in.
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    meta: ClientMeta,
) -> AppResult<Json<ApiResponse<()>>> {
    SessionRepo::revoke_by_jti(&state.pool, &auth_user.session_id).await?;
    state.ws_manager.close_session(&auth_user.session_id, None).await;

    let mut event = AuthEvent::success(&auth_user.username, ACTION_LOGOUT);
    event.session_id = Some(auth_user.session_id);
    record_auth_event(&state, &meta, event).await;

    Ok(Json(ApiResponse::message("Logged out")))
}

/// POST /api/v1/auth/register
///
/// Admin-only. Creates a user whose superior is the registering admin.
pub async fn register(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    meta: ClientMeta,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserInfo>>)> {
    let role = check_registration(&input)?.to_string();

    if UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Username '{}' is already taken",
            input.username
        ))));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
            role,
            superior: Some(admin.username.clone()),
        },
    )
    .await?;

    record_auth_event(
        &state,
        &meta,
        AuthEvent::success(&user.username, ACTION_REGISTER),
    )
    .await;

    tracing::info!(user_id = user.id, registered_by = %admin.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::ok(UserInfo {
                id: user.id,
                username: user.username,
                email: user.email,
                role: user.role,
            })
            .with_message("User registered"),
        ),
    ))
}

/// GET /api/v1/auth/logs
///
/// Admin-only paginated auth log, newest first.
pub async fn auth_logs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<AuthLogParams>,
) -> AppResult<Json<ApiResponse<Page<AuthLog>>>> {
    check_log_filters(&params)?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LOG_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let clock = state.config.display_clock;
    let query = AuthLogQuery {
        username: params.username.filter(|u| !u.trim().is_empty()),
        action: params.action,
        result: params.result,
        from: parse_date(params.start_date.as_deref()).and_then(|d| clock.start_of_day(d)),
        to: parse_date(params.end_date.as_deref()).and_then(|d| clock.end_of_day(d)),
        limit,
        offset: (page - 1) * limit,
    };

    let items = AuthLogRepo::query(&state.pool, &query).await?;
    let total = AuthLogRepo::count(&state.pool, &query).await?;

    Ok(Json(ApiResponse::ok(Page {
        items,
        total,
        page,
        limit,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Field rules for a new account. Returns the role to create it with.
fn check_registration(input: &RegisterRequest) -> AppResult<&str> {
    input.validate()?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(AppError::BadRequest)?;

    let role = input.role.as_deref().unwrap_or(ROLE_USER);
    if !is_valid_role(role) {
        return Err(AppError::BadRequest(format!("Unknown role '{role}'")));
    }
    Ok(role)
}

fn check_log_filters(params: &AuthLogParams) -> AppResult<()> {
    if let Some(action) = params.action.as_deref() {
        if !is_valid_action(action) {
            return Err(AppError::BadRequest(format!("Unknown action '{action}'")));
        }
    }
    if let Some(result) = params.result.as_deref() {
        if !is_valid_result(result) {
            return Err(AppError::BadRequest(format!("Unknown result '{result}'")));
        }
    }
    Ok(())
}

/// Sign a new access token for `user` and record its session row.
async fn issue_session(
    state: &AppState,
    user: &User,
    meta: &ClientMeta,
) -> AppResult<(String, Claims)> {
    let (access_token, claims) =
        generate_access_token(user.id, &user.username, &user.role, &state.config.jwt)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            jti: claims.jti.clone(),
            expires_at: token_expiry(&claims)?,
            user_agent: meta.user_agent.clone(),
            ip_address: meta.ip_address.clone(),
        },
    )
    .await?;

    Ok((access_token, claims))
}

fn token_expiry(claims: &Claims) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp(claims.exp, 0)
        .ok_or_else(|| AppError::InternalError(format!("Token expiry out of range: {}", claims.exp)))
}

fn login_response(state: &AppState, access_token: String, user: User) -> LoginResponse {
    LoginResponse {
        access_token,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserInfo {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        },
    }
}

struct AuthEvent<'a> {
    username: &'a str,
    action: &'static str,
    result: &'static str,
    error_message: Option<&'static str>,
    session_id: Option<String>,
}

impl<'a> AuthEvent<'a> {
    fn success(username: &'a str, action: &'static str) -> Self {
        Self {
            username,
            action,
            result: RESULT_SUCCESS,
            error_message: None,
            session_id: None,
        }
    }

    fn failure(username: &'a str, action: &'static str, error: &'static str) -> Self {
        Self {
            username,
            action,
            result: RESULT_FAILURE,
            error_message: Some(error),
            session_id: None,
        }
    }
}

/// Append an auth log entry. A failed insert is logged, never surfaced.
async fn record_auth_event(state: &AppState, meta: &ClientMeta, event: AuthEvent<'_>) {
    let now = chrono::Utc::now();
    let clock = state.config.display_clock;
    let user_agent = meta.user_agent.as_deref();

    let input = CreateAuthLog {
        username: event.username.to_string(),
        action: event.action.to_string(),
        result: event.result.to_string(),
        display_date: Some(clock.display_date(now)),
        display_time: Some(clock.display_time(now)),
        ip_address: meta.ip_address.clone(),
        user_agent: user_agent.map(str::to_string),
        browser: user_agent.map(|ua| browser_family(ua).to_string()),
        operating_system: user_agent.map(|ua| operating_system(ua).to_string()),
        error_message: event.error_message.map(str::to_string),
        session_id: event.session_id,
    };

    if let Err(e) = AuthLogRepo::create(&state.pool, &input).await {
        tracing::warn!(
            error = %e,
            username = event.username,
            action = event.action,
            "Failed to write auth log"
        );
    }
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value?.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn registration(password: &str, role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            username: "newbie".into(),
            email: "newbie@example.com".into(),
            password: password.into(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn registration_defaults_to_the_user_role() {
        let input = registration("long-enough-password", None);
        assert_eq!(check_registration(&input).unwrap(), ROLE_USER);

        let admin = registration("long-enough-password", Some("admin"));
        assert_eq!(check_registration(&admin).unwrap(), "admin");
    }

    #[test]
    fn registration_rejects_short_password_and_unknown_role() {
        assert_matches!(
            check_registration(&registration("short", None)),
            Err(AppError::BadRequest(_))
        );
        assert_matches!(
            check_registration(&registration("long-enough-password", Some("superuser"))),
            Err(AppError::BadRequest(ref msg)) if msg.contains("superuser")
        );
    }

    #[test]
    fn registration_rejects_invalid_email() {
        let mut input = registration("long-enough-password", None);
        input.email = "nope".into();
        assert_matches!(
            check_registration(&input),
            Err(AppError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn log_filters_reject_unknown_action_and_result() {
        let unknown_action = AuthLogParams {
            action: Some("delete".into()),
            ..Default::default()
        };
        assert_matches!(check_log_filters(&unknown_action), Err(AppError::BadRequest(_)));

        let unknown_result = AuthLogParams {
            result: Some("maybe".into()),
            ..Default::default()
        };
        assert_matches!(check_log_filters(&unknown_result), Err(AppError::BadRequest(_)));

        let known = AuthLogParams {
            action: Some("login".into()),
            result: Some("failure".into()),
            ..Default::default()
        };
        assert!(check_log_filters(&known).is_ok());
    }

    #[test]
    fn parse_date_ignores_garbage() {
        assert_eq!(
            parse_date(Some("2025-07-29")),
            NaiveDate::from_ymd_opt(2025, 7, 29)
        );
        assert_eq!(parse_date(Some("29/07/2025")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn token_expiry_follows_the_exp_claim() {
        let claims = Claims {
            sub: 1,
            username: "dana".into(),
            role: "admin".into(),
            exp: 1_740_000_000,
            iat: 1_739_999_100,
            jti: "jti".into(),
        };
        assert_eq!(token_expiry(&claims).unwrap().timestamp(), 1_740_000_000);

        let far_future = Claims {
            exp: i64::MAX,
            ..claims
        };
        assert!(token_expiry(&far_future).is_err());
    }

    #[test]
    fn register_request_validates_email_and_username() {
        let bad = RegisterRequest {
            username: "ab".into(),
            email: "not-an-email".into(),
            password: "long-enough-1".into(),
            role: None,
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
    }
}
