//! Handler for `GET /statistics`.

use axum::extract::{Query, State};
use axum::Json;
use crashalert_core::filter::{filter, FilterCriteria, FilterParams};
use crashalert_core::statistics::{aggregate_with_clock, StatisticsSnapshot};
use crashalert_db::repositories::AccidentRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/statistics
///
/// Aggregates handled accidents after applying the filter query params.
/// Time buckets use the filter's clock.
pub async fn get_statistics(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<FilterParams>,
) -> AppResult<Json<ApiResponse<StatisticsSnapshot>>> {
    let criteria = FilterCriteria::from_params(params, state.config.display_clock);
    let handled = AccidentRepo::list_handled(&state.pool).await?;
    let selected = filter(&handled, &criteria);

    tracing::debug!(
        handled = handled.len(),
        selected = selected.len(),
        "Computing statistics"
    );

    Ok(Json(ApiResponse::ok(aggregate_with_clock(
        &selected,
        &criteria.clock,
    ))))
}
