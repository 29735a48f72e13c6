//! Accident record, severity and status enums, and the ingestion DTO.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Detected accident severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(CoreError::Validation(format!(
                "Invalid severity '{other}'. Expected one of: low, medium, high"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// AccidentStatus
// ---------------------------------------------------------------------------

/// Triage status of an accident.
///
/// The usual flow is `active -> assigned -> handled`, with
/// `assigned -> active` as an explicit unassign. Any status may be set
/// directly; a handled accident can be reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccidentStatus {
    Active,
    Assigned,
    Handled,
}

impl AccidentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AccidentStatus::Active => "active",
            AccidentStatus::Assigned => "assigned",
            AccidentStatus::Handled => "handled",
        }
    }

    /// Statuses that keep an accident on the live dashboard.
    pub fn is_open(self) -> bool {
        !matches!(self, AccidentStatus::Handled)
    }

    /// The `assigned_to` value an accident should carry after moving to
    /// this status at the request of `actor`.
    ///
    /// - `assigned` always takes the actor.
    /// - `active` clears the assignee (unassign).
    /// - `handled` keeps the current assignee, falling back to the actor, so
    ///   handled accidents remain attributable to a responder.
    pub fn assignee_after(self, actor: &str, current: Option<&str>) -> Option<String> {
        match self {
            AccidentStatus::Assigned => Some(actor.to_string()),
            AccidentStatus::Active => None,
            AccidentStatus::Handled => Some(
                current
                    .filter(|c| !c.is_empty())
                    .unwrap_or(actor)
                    .to_string(),
            ),
        }
    }
}

impl fmt::Display for AccidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccidentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(AccidentStatus::Active),
            "assigned" => Ok(AccidentStatus::Assigned),
            "handled" => Ok(AccidentStatus::Handled),
            other => Err(CoreError::Validation(format!(
                "Invalid status '{other}'. Expected one of: active, assigned, handled"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Accident
// ---------------------------------------------------------------------------

/// A detected traffic incident.
///
/// `display_date` / `display_time` are the local-time renderings computed
/// once at ingestion (see [`crate::normalize::LocalClock`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accident {
    pub id: DbId,
    pub camera_id: String,
    pub location: String,
    pub occurred_at: Timestamp,
    pub display_date: Option<String>,
    pub display_time: Option<String>,
    pub severity: Severity,
    pub status: AccidentStatus,
    pub assigned_to: Option<String>,
    pub false_positive: bool,
    pub description: Option<String>,
    pub video: Option<String>,
}

impl Accident {
    /// The assignee, treating an empty string as unassigned.
    pub fn assignee(&self) -> Option<&str> {
        self.assigned_to.as_deref().filter(|a| !a.is_empty())
    }
}

/// Ingestion DTO for a freshly detected accident.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAccident {
    #[validate(length(min = 1, message = "camera_id is required"))]
    pub camera_id: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    /// Defaults to the ingestion time when absent.
    pub occurred_at: Option<Timestamp>,
    pub severity: Severity,
    pub video: Option<String>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!(" medium ".parse::<Severity>().unwrap(), Severity::Medium);
        assert_matches!("severe".parse::<Severity>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn status_round_trips_through_display() {
        for status in [
            AccidentStatus::Active,
            AccidentStatus::Assigned,
            AccidentStatus::Handled,
        ] {
            assert_eq!(status.to_string().parse::<AccidentStatus>().unwrap(), status);
        }
        assert_matches!("closed".parse::<AccidentStatus>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn assigning_takes_the_actor() {
        assert_eq!(
            AccidentStatus::Assigned.assignee_after("dana", Some("lee")),
            Some("dana".to_string())
        );
    }

    #[test]
    fn unassigning_clears_the_assignee() {
        assert_eq!(AccidentStatus::Active.assignee_after("dana", Some("lee")), None);
    }

    #[test]
    fn handling_keeps_existing_assignee() {
        assert_eq!(
            AccidentStatus::Handled.assignee_after("dana", Some("lee")),
            Some("lee".to_string())
        );
        assert_eq!(
            AccidentStatus::Handled.assignee_after("dana", Some("")),
            Some("dana".to_string())
        );
        assert_eq!(
            AccidentStatus::Handled.assignee_after("dana", None),
            Some("dana".to_string())
        );
    }

    #[test]
    fn new_accident_requires_camera_and_location() {
        let input = NewAccident {
            camera_id: String::new(),
            location: "Main Road".into(),
            occurred_at: None,
            severity: Severity::Low,
            video: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn serializes_enums_lowercase() {
        let json = serde_json::to_value(Severity::Medium).unwrap();
        assert_eq!(json, "medium");
        let json = serde_json::to_value(AccidentStatus::Handled).unwrap();
        assert_eq!(json, "handled");
    }
}
