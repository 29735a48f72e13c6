//! Accident row model and write DTOs.

use crashalert_core::accident::{Accident, AccidentStatus, NewAccident, Severity};
use crashalert_core::error::CoreError;
use crashalert_core::normalize::LocalClock;
use crashalert_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Raw row from the `accidents` table.
///
/// `severity` and `status` are stored as text; convert with
/// [`Accident::try_from`] before handing the record to domain code.
#[derive(Debug, Clone, FromRow)]
pub struct AccidentRow {
    pub id: DbId,
    pub camera_id: String,
    pub location: String,
    pub occurred_at: Timestamp,
    pub display_date: Option<String>,
    pub display_time: Option<String>,
    pub severity: String,
    pub status: String,
    pub assigned_to: Option<String>,
    pub false_positive: bool,
    pub description: Option<String>,
    pub video: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<AccidentRow> for Accident {
    type Error = CoreError;

    fn try_from(row: AccidentRow) -> Result<Self, Self::Error> {
        Ok(Accident {
            id: row.id,
            camera_id: row.camera_id,
            location: row.location,
            occurred_at: row.occurred_at,
            display_date: row.display_date,
            display_time: row.display_time,
            severity: row.severity.parse()?,
            status: row.status.parse()?,
            assigned_to: row.assigned_to,
            false_positive: row.false_positive,
            description: row.description,
            video: row.video,
        })
    }
}

/// Insert DTO with the display strings already rendered.
#[derive(Debug, Clone)]
pub struct CreateAccident {
    pub camera_id: String,
    pub location: String,
    pub occurred_at: Timestamp,
    pub display_date: String,
    pub display_time: String,
    pub severity: Severity,
    pub video: Option<String>,
}

impl CreateAccident {
    /// Prepare an ingested detection for storage. A missing `occurred_at`
    /// falls back to `now`.
    pub fn from_new(input: NewAccident, clock: &LocalClock, now: Timestamp) -> Self {
        let occurred_at = input.occurred_at.unwrap_or(now);
        Self {
            camera_id: input.camera_id.trim().to_string(),
            location: input.location.trim().to_string(),
            occurred_at,
            display_date: clock.display_date(occurred_at),
            display_time: clock.display_time(occurred_at),
            severity: input.severity,
            video: input.video,
        }
    }
}

/// Partial update of responder-editable details. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccidentDetails {
    pub severity: Option<Severity>,
    pub description: Option<String>,
    pub false_positive: Option<bool>,
}

/// Status change together with the resulting assignee.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: AccidentStatus,
    pub assigned_to: Option<String>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn row(severity: &str, status: &str) -> AccidentRow {
        let at: Timestamp = "2025-07-29T10:00:00Z".parse().unwrap();
        AccidentRow {
            id: 7,
            camera_id: "cam-1".into(),
            location: "Main Road".into(),
            occurred_at: at,
            display_date: Some("29/07/2025".into()),
            display_time: Some("10:00:00".into()),
            severity: severity.into(),
            status: status.into(),
            assigned_to: None,
            false_positive: false,
            description: None,
            video: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn row_converts_to_accident() {
        let accident = Accident::try_from(row("high", "assigned")).unwrap();
        assert_eq!(accident.severity, Severity::High);
        assert_eq!(accident.status, AccidentStatus::Assigned);
        assert_eq!(accident.id, 7);
    }

    #[test]
    fn unknown_stored_enum_is_rejected() {
        assert_matches!(
            Accident::try_from(row("extreme", "active")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn from_new_renders_display_strings_and_defaults_time() {
        let now: Timestamp = "2025-07-29T22:09:24Z".parse().unwrap();
        let clock = LocalClock::from_offset_minutes(180).unwrap();
        let input = NewAccident {
            camera_id: " cam-9 ".into(),
            location: "Harbor St".into(),
            occurred_at: None,
            severity: Severity::Low,
            video: None,
        };

        let create = CreateAccident::from_new(input, &clock, now);
        assert_eq!(create.occurred_at, now);
        assert_eq!(create.camera_id, "cam-9");
        assert_eq!(create.display_date, "30/07/2025");
        assert_eq!(create.display_time, "01:09:24");
    }
}
