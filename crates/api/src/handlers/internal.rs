//! Service-to-service handlers under `/internal`.
//!
//! Called by the detection service with the shared `X-Internal-Secret`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use crashalert_core::accident::{Accident, NewAccident};
use crashalert_core::normalize::LocalClock;
use crashalert_db::models::accident::CreateAccident;
use crashalert_db::models::camera::InternalCamera;
use crashalert_db::repositories::{AccidentRepo, CameraRepo};
use crashalert_db::DbPool;
use crashalert_events::{AccidentEvent, EventBus};
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::internal::InternalCaller;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Persist a detection as an `active` accident and publish `new_accident`.
///
/// Shared by `POST /internal/accidents` and the detection simulator.
pub async fn ingest_detection(
    pool: &DbPool,
    event_bus: &EventBus,
    clock: &LocalClock,
    input: NewAccident,
) -> AppResult<Accident> {
    input.validate()?;

    let create = CreateAccident::from_new(input, clock, chrono::Utc::now());
    let accident = AccidentRepo::create(pool, &create).await?;

    tracing::info!(
        accident_id = accident.id,
        camera_id = %accident.camera_id,
        severity = %accident.severity,
        "Accident detected"
    );
    event_bus.publish(AccidentEvent::new_accident(accident.clone()));

    Ok(accident)
}

/// POST /api/v1/internal/accidents
pub async fn post_accident(
    State(state): State<AppState>,
    _caller: InternalCaller,
    Json(input): Json<NewAccident>,
) -> AppResult<(StatusCode, Json<ApiResponse<Accident>>)> {
    let accident = ingest_detection(
        &state.pool,
        &state.event_bus,
        &state.config.display_clock,
        input,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(accident).with_message("Accident recorded")),
    ))
}

/// GET /api/v1/internal/cameras
pub async fn get_cameras(
    State(state): State<AppState>,
    _caller: InternalCaller,
) -> AppResult<Json<ApiResponse<Vec<InternalCamera>>>> {
    let cameras = CameraRepo::list_internal(&state.pool).await?;
    Ok(Json(ApiResponse::ok(cameras)))
}
