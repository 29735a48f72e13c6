//! Repository for the `cameras` and `camera_users` tables.

use crashalert_core::types::DbId;
use sqlx::PgPool;

use crate::models::camera::{Camera, CameraDetails, CameraLocation, CreateCamera, InternalCamera};

const COLUMNS: &str = "id, camera_id, location, demo_video, created_at";

/// Camera columns plus the derived user and accident collections.
const DETAIL_COLUMNS: &str = "\
    c.id, c.camera_id, c.location, c.demo_video, \
    ARRAY(SELECT u.username FROM camera_users cu JOIN users u ON u.id = cu.user_id \
          WHERE cu.camera_id = c.id ORDER BY u.username) AS users, \
    ARRAY(SELECT a.id FROM accidents a \
          WHERE a.camera_id = c.camera_id AND a.status IN ('active', 'assigned') \
          ORDER BY a.occurred_at DESC) AS active_accidents, \
    ARRAY(SELECT a.id FROM accidents a \
          WHERE a.camera_id = c.camera_id AND a.status = 'handled' \
          ORDER BY a.occurred_at DESC) AS accident_history";

pub struct CameraRepo;

impl CameraRepo {
    /// Insert a camera and authorize the given users on it, atomically.
    pub async fn create(pool: &PgPool, input: &CreateCamera) -> Result<Camera, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO cameras (camera_id, location, demo_video)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let camera = sqlx::query_as::<_, Camera>(&query)
            .bind(&input.camera_id)
            .bind(&input.location)
            .bind(&input.demo_video)
            .fetch_one(&mut *tx)
            .await?;

        if !input.users.is_empty() {
            sqlx::query(
                "INSERT INTO camera_users (camera_id, user_id)
                 SELECT $1, UNNEST($2::BIGINT[])
                 ON CONFLICT DO NOTHING",
            )
            .bind(camera.id)
            .bind(&input.users)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(camera)
    }

    pub async fn find_by_camera_id(
        pool: &PgPool,
        camera_id: &str,
    ) -> Result<Option<Camera>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cameras WHERE camera_id = $1");
        sqlx::query_as::<_, Camera>(&query)
            .bind(camera_id)
            .fetch_optional(pool)
            .await
    }

    /// Every camera with users, open accident ids and handled accident ids.
    pub async fn list_details(pool: &PgPool) -> Result<Vec<CameraDetails>, sqlx::Error> {
        let query = format!("SELECT {DETAIL_COLUMNS} FROM cameras c ORDER BY c.camera_id");
        sqlx::query_as::<_, CameraDetails>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn list_locations(pool: &PgPool) -> Result<Vec<CameraLocation>, sqlx::Error> {
        sqlx::query_as::<_, CameraLocation>(
            "SELECT camera_id, location FROM cameras ORDER BY camera_id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_internal(pool: &PgPool) -> Result<Vec<InternalCamera>, sqlx::Error> {
        sqlx::query_as::<_, InternalCamera>(
            "SELECT camera_id, location, demo_video FROM cameras ORDER BY camera_id",
        )
        .fetch_all(pool)
        .await
    }

    /// How many of `camera_ids` exist. Duplicates in the input count once.
    pub async fn count_existing(pool: &PgPool, camera_ids: &[String]) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM cameras WHERE camera_id = ANY($1)",
        )
        .bind(camera_ids)
        .fetch_one(pool)
        .await
    }

    /// Make `camera_ids` the user's complete camera set: add missing links
    /// and drop links to cameras not listed.
    pub async fn assign_to_user(
        pool: &PgPool,
        user_id: DbId,
        camera_ids: &[String],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM camera_users cu
             USING cameras c
             WHERE cu.camera_id = c.id AND cu.user_id = $1 AND NOT (c.camera_id = ANY($2))",
        )
        .bind(user_id)
        .bind(camera_ids)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO camera_users (camera_id, user_id)
             SELECT id, $1 FROM cameras WHERE camera_id = ANY($2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(camera_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
