//! Synthetic detection feed for demos and local development.
//!
//! [`DetectionSimulator`] ingests one accident per interval through the same
//! path as `POST /internal/accidents`, so dashboards receive live
//! `new_accident` frames without a detection service running.

use std::sync::Arc;
use std::time::Duration;

use crashalert_core::accident::{NewAccident, Severity};
use crashalert_core::normalize::LocalClock;
use crashalert_db::models::camera::InternalCamera;
use crashalert_db::repositories::CameraRepo;
use crashalert_db::DbPool;
use crashalert_events::EventBus;
use tokio_util::sync::CancellationToken;

use crate::handlers::internal::ingest_detection;

/// Used when no cameras are registered yet.
const FALLBACK_CAMERA_ID: &str = "accident_94";
const FALLBACK_LOCATION: &str = "Highway 1";
const FALLBACK_VIDEO: &str =
    "https://drive.google.com/file/d/1PrdFv0D57EKBeGtslIJjlQGJGjQszRfE/view";

// ---------------------------------------------------------------------------
// DetectionSimulator
// ---------------------------------------------------------------------------

pub struct DetectionSimulator {
    pool: DbPool,
    event_bus: Arc<EventBus>,
    clock: LocalClock,
    interval: Duration,
}

impl DetectionSimulator {
    pub fn new(
        pool: DbPool,
        event_bus: Arc<EventBus>,
        clock: LocalClock,
        interval: Duration,
    ) -> Self {
        Self {
            pool,
            event_bus,
            clock,
            interval,
        }
    }

    /// Run until `cancel` fires. Failed ticks are logged and skipped.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        // The first tick completes immediately; wait a full period instead.
        interval.tick().await;
        let mut tick: usize = 0;

        tracing::info!(interval_secs = self.interval.as_secs(), "Detection simulator started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Detection simulator cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.emit(tick).await {
                        tracing::error!(error = %e, "Simulated detection failed");
                    }
                    tick = tick.wrapping_add(1);
                }
            }
        }
    }

    async fn emit(&self, tick: usize) -> Result<(), crate::error::AppError> {
        let cameras = CameraRepo::list_internal(&self.pool).await?;
        let detection = synthetic_detection(tick, &cameras);
        ingest_detection(&self.pool, &self.event_bus, &self.clock, detection).await?;
        Ok(())
    }
}

/// The detection for a given tick: cameras in rotation, severities cycling
/// low, medium, high.
fn synthetic_detection(tick: usize, cameras: &[InternalCamera]) -> NewAccident {
    let severity = Severity::ALL[tick % Severity::ALL.len()];

    match cameras.get(tick % cameras.len().max(1)) {
        Some(camera) => NewAccident {
            camera_id: camera.camera_id.clone(),
            location: camera.location.clone(),
            occurred_at: None,
            severity,
            video: camera.demo_video.clone(),
        },
        None => NewAccident {
            camera_id: FALLBACK_CAMERA_ID.to_string(),
            location: FALLBACK_LOCATION.to_string(),
            occurred_at: None,
            severity,
            video: Some(FALLBACK_VIDEO.to_string()),
        },
    }
}
