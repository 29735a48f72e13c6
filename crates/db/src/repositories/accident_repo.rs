//! Repository for the `accidents` table.

use crashalert_core::accident::{Accident, AccidentStatus};
use crashalert_core::types::DbId;
use sqlx::PgPool;

use crate::models::accident::{AccidentRow, CreateAccident, StatusChange, UpdateAccidentDetails};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, camera_id, location, occurred_at, display_date, display_time, \
                       severity, status, assigned_to, false_positive, description, video, \
                       created_at, updated_at";

/// Convert a row, surfacing bad stored enum text as a decode error.
fn decode(row: AccidentRow) -> Result<Accident, sqlx::Error> {
    Accident::try_from(row).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn decode_all(rows: Vec<AccidentRow>) -> Result<Vec<Accident>, sqlx::Error> {
    rows.into_iter().map(decode).collect()
}

pub struct AccidentRepo;

impl AccidentRepo {
    /// Insert a detected accident with status `active`.
    pub async fn create(pool: &PgPool, input: &CreateAccident) -> Result<Accident, sqlx::Error> {
        let query = format!(
            "INSERT INTO accidents
                (camera_id, location, occurred_at, display_date, display_time, severity, video)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccidentRow>(&query)
            .bind(&input.camera_id)
            .bind(&input.location)
            .bind(input.occurred_at)
            .bind(&input.display_date)
            .bind(&input.display_time)
            .bind(input.severity.as_str())
            .bind(&input.video)
            .fetch_one(pool)
            .await?;
        decode(row)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Accident>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accidents WHERE id = $1");
        sqlx::query_as::<_, AccidentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(decode)
            .transpose()
    }

    /// Accidents still on the live dashboard (`active` or `assigned`),
    /// newest first.
    pub async fn list_open(pool: &PgPool) -> Result<Vec<Accident>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM accidents
             WHERE status IN ('active', 'assigned')
             ORDER BY occurred_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, AccidentRow>(&query)
            .fetch_all(pool)
            .await?;
        decode_all(rows)
    }

    /// All handled accidents, newest first.
    pub async fn list_handled(pool: &PgPool) -> Result<Vec<Accident>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM accidents
             WHERE status = $1
             ORDER BY occurred_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, AccidentRow>(&query)
            .bind(AccidentStatus::Handled.as_str())
            .fetch_all(pool)
            .await?;
        decode_all(rows)
    }

    /// Set status and assignee together.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        change: &StatusChange,
    ) -> Result<Option<Accident>, sqlx::Error> {
        let query = format!(
            "UPDATE accidents SET
                status = $2,
                assigned_to = $3,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccidentRow>(&query)
            .bind(id)
            .bind(change.status.as_str())
            .bind(&change.assigned_to)
            .fetch_optional(pool)
            .await?
            .map(decode)
            .transpose()
    }

    /// Update responder-editable details. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_details(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAccidentDetails,
    ) -> Result<Option<Accident>, sqlx::Error> {
        let query = format!(
            "UPDATE accidents SET
                severity = COALESCE($2, severity),
                description = COALESCE($3, description),
                false_positive = COALESCE($4, false_positive),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccidentRow>(&query)
            .bind(id)
            .bind(input.severity.map(|s| s.as_str()))
            .bind(&input.description)
            .bind(input.false_positive)
            .fetch_optional(pool)
            .await?
            .map(decode)
            .transpose()
    }
}
