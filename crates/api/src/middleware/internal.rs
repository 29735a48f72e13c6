//! Shared-secret guard for service-to-service routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use crashalert_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the internal shared secret.
pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

/// Marker extractor for callers presenting the configured internal secret.
///
/// Rejects with 403 when the header is missing or wrong, and also when no
/// secret is configured at all.
pub struct InternalCaller;

impl FromRequestParts<AppState> for InternalCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(INTERNAL_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());

        match (state.config.internal_secret.as_deref(), provided) {
            (Some(expected), Some(given)) if expected == given => Ok(InternalCaller),
            _ => Err(AppError::Core(CoreError::Forbidden(
                "Invalid internal secret".into(),
            ))),
        }
    }
}
