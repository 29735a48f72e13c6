//! Repository for the append-only `auth_logs` table.

use crashalert_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::auth_log::{AuthLog, AuthLogQuery, CreateAuthLog};

const COLUMNS: &str = "\
    id, username, action, result, occurred_at, display_date, display_time, \
    ip_address, user_agent, browser, operating_system, error_message, session_id";

/// Largest page the log viewer may request.
pub const MAX_PAGE_SIZE: i64 = 100;

pub struct AuthLogRepo;

impl AuthLogRepo {
    pub async fn create(pool: &PgPool, input: &CreateAuthLog) -> Result<AuthLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO auth_logs
                (username, action, result, display_date, display_time, ip_address,
                 user_agent, browser, operating_system, error_message, session_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuthLog>(&query)
            .bind(&input.username)
            .bind(&input.action)
            .bind(&input.result)
            .bind(&input.display_date)
            .bind(&input.display_time)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(&input.browser)
            .bind(&input.operating_system)
            .bind(&input.error_message)
            .bind(&input.session_id)
            .fetch_one(pool)
            .await
    }

    /// Query auth logs with filtering and pagination, newest first.
    pub async fn query(pool: &PgPool, params: &AuthLogQuery) -> Result<Vec<AuthLog>, sqlx::Error> {
        let limit = params.limit.clamp(1, MAX_PAGE_SIZE);
        let offset = params.offset.max(0);

        let (where_clause, bind_values, bind_idx) = build_filter(params);

        let query = format!(
            "SELECT {COLUMNS} FROM auth_logs {where_clause} \
             ORDER BY occurred_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let q = bind_values_as(sqlx::query_as::<_, AuthLog>(&query), &bind_values);
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count auth logs matching the filter (for pagination metadata).
    pub async fn count(pool: &PgPool, params: &AuthLogQuery) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_filter(params);

        let query = format!("SELECT COUNT(*)::BIGINT AS count FROM auth_logs {where_clause}");

        let q = bind_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values);
        q.fetch_one(pool).await
    }
}

// ---------------------------------------------------------------------------
// Dynamic filter helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    Text(String),
    Timestamp(Timestamp),
}

/// Build the `WHERE` clause, its bind values, and the next placeholder index.
fn build_filter(params: &AuthLogQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(ref username) = params.username {
        conditions.push(format!("username ILIKE ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(format!("%{}%", escape_like(username))));
    }

    if let Some(ref action) = params.action {
        conditions.push(format!("action = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(action.clone()));
    }

    if let Some(ref result) = params.result {
        conditions.push(format!("result = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(result.clone()));
    }

    if let Some(from) = params.from {
        conditions.push(format!("occurred_at >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = params.to {
        conditions.push(format!("occurred_at <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Escape `ILIKE` wildcards so user input matches literally.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn bind_values_as<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

fn bind_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}
