//! Predicate filter over in-memory accident lists.
//!
//! A [`FilterCriteria`] is a conjunction of optional constraints. Absent
//! constraints match everything, so an all-empty criteria is the identity.
//! Filtering is pure and preserves input order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::accident::{Accident, Severity};
use crate::normalize::{normalize_text, LocalClock, NormalizedAccident};

/// Raw filter input as it arrives in a query string.
///
/// Every field is optional free text; [`FilterCriteria::from`] decides what
/// is usable. `responders` is a comma-separated list of usernames.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub camera_id: Option<String>,
    pub location: Option<String>,
    pub severity: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub responders: Option<String>,
    pub utc_offset_minutes: Option<String>,
}

/// Validated, normalized filter constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Lowercased camera id.
    pub camera_id: Option<String>,
    /// Lowercased location.
    pub location: Option<String>,
    pub severity: Option<Severity>,
    /// Inclusive, from local start of day.
    pub start_date: Option<NaiveDate>,
    /// Inclusive, to local end of day.
    pub end_date: Option<NaiveDate>,
    /// `HH:MM` or `HH:MM:SS`, compared lexically.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Lowercased assignee usernames; empty means any.
    pub responders: Vec<String>,
    /// Clock used for day bounds and time of day.
    pub clock: LocalClock,
}

impl FilterCriteria {
    /// `true` when no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.camera_id.is_none()
            && self.location.is_none()
            && self.severity.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.responders.is_empty()
    }

    /// Evaluate every present constraint against one accident.
    pub fn matches(&self, accident: &Accident) -> bool {
        let n = NormalizedAccident::new(accident, &self.clock);

        if let Some(camera_id) = &self.camera_id {
            if n.camera_id.as_ref() != Some(camera_id) {
                return false;
            }
        }

        if let Some(location) = &self.location {
            if n.location.as_ref() != Some(location) {
                return false;
            }
        }

        if let Some(severity) = self.severity {
            if n.severity != severity {
                return false;
            }
        }

        if let Some(start) = self.start_date.and_then(|d| self.clock.start_of_day(d)) {
            if n.occurred_at < start {
                return false;
            }
        }

        if let Some(end) = self.end_date.and_then(|d| self.clock.end_of_day(d)) {
            if n.occurred_at > end {
                return false;
            }
        }

        // Lexical comparison of "HH:MM:SS" against "HH:MM[:SS]". A range
        // that wraps past midnight (start > end) matches nothing.
        if let Some(start_time) = &self.start_time {
            if n.time_of_day.as_str() < start_time.as_str() {
                return false;
            }
        }

        if let Some(end_time) = &self.end_time {
            if n.time_of_day.as_str() > end_time.as_str() {
                return false;
            }
        }

        if !self.responders.is_empty() {
            match &n.assignee {
                Some(assignee) if self.responders.contains(assignee) => {}
                _ => return false,
            }
        }

        true
    }
}

impl FilterCriteria {
    /// Build criteria from raw params, using `default_clock` when the params
    /// carry no usable `utc_offset_minutes`.
    pub fn from_params(params: FilterParams, default_clock: LocalClock) -> Self {
        let clock = params
            .utc_offset_minutes
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .and_then(LocalClock::from_offset_minutes)
            .unwrap_or(default_clock);

        let responders = params
            .responders
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(normalize_text)
            .collect();

        Self {
            camera_id: params.camera_id.as_deref().and_then(normalize_text),
            location: params.location.as_deref().and_then(normalize_text),
            severity: params.severity.as_deref().and_then(|s| s.parse().ok()),
            start_date: params.start_date.as_deref().and_then(|s| parse_date(s, &clock)),
            end_date: params.end_date.as_deref().and_then(|s| parse_date(s, &clock)),
            start_time: params.start_time.as_deref().and_then(parse_time_of_day),
            end_time: params.end_time.as_deref().and_then(parse_time_of_day),
            responders,
            clock,
        }
    }
}

impl From<FilterParams> for FilterCriteria {
    fn from(params: FilterParams) -> Self {
        Self::from_params(params, LocalClock::utc())
    }
}

/// Return the accidents satisfying every present constraint, in input order.
pub fn filter(accidents: &[Accident], criteria: &FilterCriteria) -> Vec<Accident> {
    accidents
        .iter()
        .filter(|accident| criteria.matches(accident))
        .cloned()
        .collect()
}

/// Sort oldest first. Stable, so equal timestamps keep their order.
pub fn sort_by_date_ascending(accidents: &mut [Accident]) {
    accidents.sort_by_key(|a| a.occurred_at);
}

/// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp whose local date is used.
fn parse_date(value: &str, clock: &LocalClock) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| clock.local(dt.with_timezone(&Utc)).date_naive())
}

/// Accepts `HH:MM` or `HH:MM:SS` with two-digit fields.
fn parse_time_of_day(value: &str) -> Option<String> {
    let value = value.trim();
    let parts: Vec<&str> = value.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let limits = [24u32, 60, 60];
    for (part, limit) in parts.iter().zip(limits) {
        if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: u32 = part.parse().ok()?;
        if n >= limit {
            return None;
        }
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accident::AccidentStatus;
    use crate::types::DbId;

    fn accident(id: DbId, at: &str, camera: &str, location: &str, severity: Severity) -> Accident {
        Accident {
            id,
            camera_id: camera.to_string(),
            location: location.to_string(),
            occurred_at: at.parse().unwrap(),
            display_date: None,
            display_time: None,
            severity,
            status: AccidentStatus::Handled,
            assigned_to: None,
            false_positive: false,
            description: None,
            video: None,
        }
    }

    fn sample() -> Vec<Accident> {
        vec![
            accident(1, "2025-03-01T08:15:00Z", "cam-1", "A", Severity::Low),
            accident(2, "2025-03-02T13:40:10Z", "cam-2", "A", Severity::High),
            accident(3, "2025-03-03T23:05:00Z", "CAM-1", "B", Severity::High),
        ]
    }

    fn ids(list: &[Accident]) -> Vec<DbId> {
        list.iter().map(|a| a.id).collect()
    }

    #[test]
    fn empty_criteria_is_identity() {
        let list = sample();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_empty());
        assert_eq!(filter(&list, &criteria), list);
    }

    #[test]
    fn severity_filter_keeps_order() {
        let criteria = FilterCriteria {
            severity: Some(Severity::High),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![2, 3]);
    }

    #[test]
    fn camera_match_is_case_insensitive() {
        let criteria = FilterCriteria::from(FilterParams {
            camera_id: Some("Cam-1".into()),
            ..Default::default()
        });
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![1, 3]);
    }

    #[test]
    fn result_is_a_subsequence_for_every_single_constraint() {
        let list = sample();
        let params = [
            FilterParams {
                location: Some("a".into()),
                ..Default::default()
            },
            FilterParams {
                severity: Some("low".into()),
                ..Default::default()
            },
            FilterParams {
                start_date: Some("2025-03-02".into()),
                ..Default::default()
            },
            FilterParams {
                start_time: Some("09:00".into()),
                ..Default::default()
            },
        ];
        for p in params {
            let result = ids(&filter(&list, &FilterCriteria::from(p)));
            let mut cursor = list.iter().map(|a| a.id);
            assert!(result.iter().all(|id| cursor.any(|x| x == *id)));
        }
    }

    #[test]
    fn date_range_is_inclusive_of_whole_days() {
        let criteria = FilterCriteria::from(FilterParams {
            start_date: Some("2025-03-02".into()),
            end_date: Some("2025-03-03".into()),
            ..Default::default()
        });
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![2, 3]);

        let open_start = FilterCriteria::from(FilterParams {
            end_date: Some("2025-03-01".into()),
            ..Default::default()
        });
        assert_eq!(ids(&filter(&sample(), &open_start)), vec![1]);
    }

    #[test]
    fn date_bounds_follow_the_offset() {
        // 23:05Z on the 3rd is 01:05 on the 4th at +02:00.
        let criteria = FilterCriteria::from(FilterParams {
            start_date: Some("2025-03-04".into()),
            utc_offset_minutes: Some("120".into()),
            ..Default::default()
        });
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![3]);
    }

    #[test]
    fn time_of_day_compares_lexically() {
        let criteria = FilterCriteria::from(FilterParams {
            start_time: Some("08:15".into()),
            end_time: Some("13:40".into()),
            ..Default::default()
        });
        // "13:40:10" > "13:40" lexically, so accident 2 falls outside.
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![1]);
    }

    #[test]
    fn wrapping_time_range_matches_nothing() {
        let criteria = FilterCriteria::from(FilterParams {
            start_time: Some("22:00".into()),
            end_time: Some("02:00".into()),
            ..Default::default()
        });
        assert!(filter(&sample(), &criteria).is_empty());
    }

    #[test]
    fn malformed_params_are_ignored() {
        let criteria = FilterCriteria::from(FilterParams {
            camera_id: Some("   ".into()),
            severity: Some("catastrophic".into()),
            start_date: Some("yesterday".into()),
            start_time: Some("8am".into()),
            end_time: Some("25:00".into()),
            utc_offset_minutes: Some("5000".into()),
            ..Default::default()
        });
        assert!(criteria.is_empty());
        assert_eq!(criteria.clock, LocalClock::utc());
    }

    #[test]
    fn responder_set_matches_assignee() {
        let mut list = sample();
        list[0].assigned_to = Some("Dana".into());
        list[2].assigned_to = Some("lee".into());

        let criteria = FilterCriteria::from(FilterParams {
            responders: Some("dana, LEE".into()),
            ..Default::default()
        });
        assert_eq!(ids(&filter(&list, &criteria)), vec![1, 3]);
    }

    #[test]
    fn rfc3339_dates_use_their_local_day() {
        let criteria = FilterCriteria::from(FilterParams {
            start_date: Some("2025-03-02T10:00:00+00:00".into()),
            ..Default::default()
        });
        assert_eq!(criteria.start_date, NaiveDate::from_ymd_opt(2025, 3, 2));
    }

    #[test]
    fn default_clock_applies_without_offset_param() {
        let plus_two = LocalClock::from_offset_minutes(120).unwrap();
        let criteria = FilterCriteria::from_params(
            FilterParams {
                start_date: Some("2025-03-04".into()),
                ..Default::default()
            },
            plus_two,
        );
        assert_eq!(criteria.clock, plus_two);
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![3]);

        let explicit = FilterCriteria::from_params(
            FilterParams {
                utc_offset_minutes: Some("0".into()),
                ..Default::default()
            },
            plus_two,
        );
        assert_eq!(explicit.clock, LocalClock::utc());
    }

    #[test]
    fn sorts_oldest_first() {
        let mut list = sample();
        list.reverse();
        sort_by_date_ascending(&mut list);
        assert_eq!(ids(&list), vec![1, 2, 3]);
    }
}
