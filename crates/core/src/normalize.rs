//! Field normalization shared by the filter and the aggregator.
//!
//! Accident timestamps are stored in UTC; every calendar computation
//! (display strings, day bounds, trend buckets) happens in the fixed local
//! offset held by a [`LocalClock`].

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

use crate::accident::{Accident, Severity};
use crate::types::Timestamp;

/// Display format for dates, e.g. `29/07/2025`.
const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Display format for times of day, e.g. `13:09:24`.
const DISPLAY_TIME_FORMAT: &str = "%H:%M:%S";

/// Largest accepted UTC offset, in minutes (±18h, chrono's own bound is just under 24h).
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// A fixed UTC offset used to render and bucket timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalClock {
    offset: FixedOffset,
}

impl LocalClock {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Build a clock from an offset east of UTC in minutes.
    ///
    /// Returns `None` for offsets beyond ±18 hours.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        if minutes.abs() > MAX_OFFSET_MINUTES {
            return None;
        }
        FixedOffset::east_opt(minutes * 60).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The timestamp as seen on this clock.
    pub fn local(&self, ts: Timestamp) -> DateTime<FixedOffset> {
        ts.with_timezone(&self.offset)
    }

    /// `DD/MM/YYYY` in local time.
    pub fn display_date(&self, ts: Timestamp) -> String {
        self.local(ts).format(DISPLAY_DATE_FORMAT).to_string()
    }

    /// `HH:MM:SS` (24h) in local time.
    pub fn display_time(&self, ts: Timestamp) -> String {
        self.local(ts).format(DISPLAY_TIME_FORMAT).to_string()
    }

    /// UTC instant of local `00:00:00.000` on `date`.
    pub fn start_of_day(&self, date: NaiveDate) -> Option<Timestamp> {
        let naive = date.and_hms_milli_opt(0, 0, 0, 0)?;
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// UTC instant of local `23:59:59.999` on `date`.
    pub fn end_of_day(&self, date: NaiveDate) -> Option<Timestamp> {
        let naive = date.and_hms_milli_opt(23, 59, 59, 999)?;
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::utc()
    }
}

/// Trim and lowercase a free-text field. Empty input yields `None`.
pub fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// An accident reduced to the comparable forms the filter works on.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAccident {
    pub occurred_at: Timestamp,
    /// Local `HH:MM:SS`.
    pub time_of_day: String,
    pub camera_id: Option<String>,
    pub location: Option<String>,
    pub severity: Severity,
    pub assignee: Option<String>,
}

impl NormalizedAccident {
    pub fn new(accident: &Accident, clock: &LocalClock) -> Self {
        Self {
            occurred_at: accident.occurred_at,
            time_of_day: clock.display_time(accident.occurred_at),
            camera_id: normalize_text(&accident.camera_id),
            location: normalize_text(&accident.location),
            severity: accident.severity,
            assignee: accident.assignee().and_then(normalize_text),
        }
    }
}
