//! Handlers for the `/accidents` resource.
//!
//! Every mutation publishes an `accident_update` event so connected
//! dashboards merge the change without refetching.

use axum::extract::{Query, State};
use axum::Json;
use crashalert_core::accident::{Accident, AccidentStatus, Severity};
use crashalert_core::error::CoreError;
use crashalert_core::filter::{filter, FilterCriteria, FilterParams};
use crashalert_core::types::DbId;
use crashalert_db::models::accident::{StatusChange, UpdateAccidentDetails};
use crashalert_db::repositories::AccidentRepo;
use crashalert_events::AccidentEvent;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MarkHandledRequest {
    pub accident_id: DbId,
}

/// Request body for `POST /accidents/update-accident-details`.
///
/// Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    pub accident_id: DbId,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub false_positive: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub accident_id: DbId,
    pub status: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/accidents/active-accidents
pub async fn active_accidents(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Accident>>>> {
    let accidents = AccidentRepo::list_open(&state.pool).await?;
    Ok(Json(ApiResponse::ok(accidents)))
}

/// GET /api/v1/accidents/handled-accidents
///
/// Handled accidents, newest first, narrowed by any filter query params.
pub async fn handled_accidents(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<FilterParams>,
) -> AppResult<Json<ApiResponse<Vec<Accident>>>> {
    let criteria = FilterCriteria::from_params(params, state.config.display_clock);
    let handled = AccidentRepo::list_handled(&state.pool).await?;

    let accidents = if criteria.is_empty() {
        handled
    } else {
        filter(&handled, &criteria)
    };
    Ok(Json(ApiResponse::ok(accidents)))
}

/// POST /api/v1/accidents/mark-as-handled
pub async fn mark_as_handled(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<MarkHandledRequest>,
) -> AppResult<Json<ApiResponse<Accident>>> {
    let accident =
        change_status(&state, &user, input.accident_id, AccidentStatus::Handled).await?;
    Ok(Json(
        ApiResponse::ok(accident).with_message("Accident marked as handled"),
    ))
}

/// POST /api/v1/accidents/update-accident-details
pub async fn update_accident_details(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<UpdateDetailsRequest>,
) -> AppResult<Json<ApiResponse<Accident>>> {
    let severity = input
        .severity
        .as_deref()
        .map(str::parse::<Severity>)
        .transpose()?;

    let update = UpdateAccidentDetails {
        severity,
        description: input.description,
        false_positive: input.false_positive,
    };

    let accident = AccidentRepo::update_details(&state.pool, input.accident_id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Accident",
            id: input.accident_id,
        }))?;

    tracing::info!(
        accident_id = accident.id,
        user_id = user.user_id,
        "Accident details updated"
    );
    state
        .event_bus
        .publish(AccidentEvent::updated(accident.clone()).with_actor(user.user_id));

    Ok(Json(
        ApiResponse::ok(accident).with_message("Accident details updated"),
    ))
}

/// POST /api/v1/accidents/accident-status-update
pub async fn accident_status_update(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<StatusUpdateRequest>,
) -> AppResult<Json<ApiResponse<Accident>>> {
    let status: AccidentStatus = input.status.parse()?;
    let accident = change_status(&state, &user, input.accident_id, status).await?;
    Ok(Json(
        ApiResponse::ok(accident).with_message("Accident status updated"),
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Move an accident to `status`, deriving the assignee from the actor, and
/// publish the result.
async fn change_status(
    state: &AppState,
    user: &AuthUser,
    accident_id: DbId,
    status: AccidentStatus,
) -> AppResult<Accident> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Accident",
            id: accident_id,
        })
    };

    let current = AccidentRepo::find_by_id(&state.pool, accident_id)
        .await?
        .ok_or_else(not_found)?;

    let change = StatusChange {
        status,
        assigned_to: status.assignee_after(&user.username, current.assignee()),
    };

    let accident = AccidentRepo::update_status(&state.pool, accident_id, &change)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(
        accident_id,
        from = %current.status,
        to = %accident.status,
        user_id = user.user_id,
        "Accident status changed"
    );
    state
        .event_bus
        .publish(AccidentEvent::updated(accident.clone()).with_actor(user.user_id));

    Ok(accident)
}
