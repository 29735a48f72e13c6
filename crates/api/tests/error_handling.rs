//! Tests for the `AppError` to HTTP response mapping.

mod common;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::body_json;
use crashalert_api::error::AppError;
use crashalert_core::error::CoreError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn not_found_maps_to_404() {
    let (status, json) = render(AppError::Core(CoreError::NotFound {
        entity: "Accident",
        id: 42,
    }))
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["message"], "Accident with id 42 not found");
}

#[tokio::test]
async fn conflict_maps_to_409() {
    let (status, json) =
        render(AppError::Core(CoreError::Conflict("Camera 'cam-1' already exists".into()))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn validation_and_bad_request_map_to_400() {
    let (status, json) = render(AppError::Core(CoreError::Validation("bad".into()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, json) = render(AppError::BadRequest("nope".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["message"], "nope");
}

#[tokio::test]
async fn auth_errors_map_to_401_and_403() {
    let (status, _) = render(AppError::Core(CoreError::Unauthorized("x".into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = render(AppError::Core(CoreError::Forbidden("x".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    let (status, json) =
        render(AppError::InternalError("secret connection string leaked".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["message"], "An internal error occurred");
}

#[tokio::test]
async fn row_not_found_maps_to_404() {
    let (status, json) = render(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn pool_timeout_maps_to_500() {
    let (status, json) = render(AppError::Database(sqlx::Error::PoolTimedOut)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "An internal error occurred");
}

#[tokio::test]
async fn unreachable_database_surfaces_as_500_envelope() {
    let app = common::build_test_app();
    let token = common::token_for(7, "lee", "user");

    let response =
        common::get_auth(app, "/api/v1/accidents/active-accidents", &token).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "INTERNAL_ERROR");
}
