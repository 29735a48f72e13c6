//! Statistics aggregation over accident lists.
//!
//! [`aggregate`] derives a [`StatisticsSnapshot`] from a slice of accidents.
//! The snapshot is a read model: it is recomputed from scratch on every call
//! and never mutated. Percentages are rounded to one decimal place and are
//! `0.0` for an empty input.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Timelike};
use serde::Serialize;

use crate::accident::{Accident, Severity};
use crate::normalize::LocalClock;

/// Number of locations reported in [`CoreStatistics::top5_locations`].
const TOP_LOCATIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    pub core: CoreStatistics,
    pub trends: TimeTrends,
    pub false_positives: FalsePositiveTrends,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreStatistics {
    pub total_handled: usize,
    /// One entry per severity, in `low, medium, high` order.
    pub severity_distribution: Vec<SeverityShare>,
    pub false_positive_rate: f64,
    pub top5_locations: Vec<LocationCount>,
    pub most_active_responders: Vec<ResponderCount>,
}

impl CoreStatistics {
    pub fn severity(&self, severity: Severity) -> Option<&SeverityShare> {
        self.severity_distribution
            .iter()
            .find(|share| share.severity == severity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityShare {
    pub severity: Severity,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    pub location: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponderCount {
    pub responder: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraCount {
    pub camera_id: String,
    pub count: usize,
}

/// A single time bucket and the number of accidents that fell into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount<K> {
    pub bucket: K,
    pub count: usize,
}

/// Time-bucketed counts, each sorted ascending by bucket key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeTrends {
    /// `YYYY-MM`
    pub monthly: Vec<BucketCount<String>>,
    /// ISO week, `YYYY-Www`
    pub weekly: Vec<BucketCount<String>>,
    /// `YYYY-MM-DD`
    pub daily: Vec<BucketCount<String>>,
    /// Hour of day, `0..=23`
    pub hourly: Vec<BucketCount<u32>>,
}

/// False-positive histograms, sorted descending by count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FalsePositiveTrends {
    pub by_location: Vec<LocationCount>,
    pub by_camera_id: Vec<CameraCount>,
}

/// Aggregate with calendar buckets in UTC.
pub fn aggregate(accidents: &[Accident]) -> StatisticsSnapshot {
    aggregate_with_clock(accidents, &LocalClock::utc())
}

/// Aggregate with calendar buckets on `clock`.
pub fn aggregate_with_clock(accidents: &[Accident], clock: &LocalClock) -> StatisticsSnapshot {
    StatisticsSnapshot {
        core: core_statistics(accidents),
        trends: time_trends(accidents, clock),
        false_positives: false_positive_trends(accidents),
    }
}

pub fn core_statistics(accidents: &[Accident]) -> CoreStatistics {
    let total = accidents.len();

    let severity_distribution = Severity::ALL
        .iter()
        .map(|&severity| {
            let count = accidents.iter().filter(|a| a.severity == severity).count();
            SeverityShare {
                severity,
                count,
                percentage: percentage(count, total),
            }
        })
        .collect();

    let false_positives = accidents.iter().filter(|a| a.false_positive).count();

    let top5_locations = ranked(accidents.iter().map(|a| a.location.as_str()))
        .into_iter()
        .take(TOP_LOCATIONS)
        .map(|(location, count)| LocationCount { location, count })
        .collect();

    let most_active_responders = ranked(accidents.iter().filter_map(Accident::assignee))
        .into_iter()
        .map(|(responder, count)| ResponderCount { responder, count })
        .collect();

    CoreStatistics {
        total_handled: total,
        severity_distribution,
        false_positive_rate: percentage(false_positives, total),
        top5_locations,
        most_active_responders,
    }
}

pub fn time_trends(accidents: &[Accident], clock: &LocalClock) -> TimeTrends {
    let mut monthly = BTreeMap::new();
    let mut weekly = BTreeMap::new();
    let mut daily = BTreeMap::new();
    let mut hourly = BTreeMap::new();

    for accident in accidents {
        let local = clock.local(accident.occurred_at);
        let week = local.iso_week();

        *monthly.entry(local.format("%Y-%m").to_string()).or_insert(0) += 1;
        *weekly
            .entry(format!("{:04}-W{:02}", week.year(), week.week()))
            .or_insert(0) += 1;
        *daily.entry(local.format("%Y-%m-%d").to_string()).or_insert(0) += 1;
        *hourly.entry(local.hour()).or_insert(0) += 1;
    }

    TimeTrends {
        monthly: buckets(monthly),
        weekly: buckets(weekly),
        daily: buckets(daily),
        hourly: buckets(hourly),
    }
}

pub fn false_positive_trends(accidents: &[Accident]) -> FalsePositiveTrends {
    let flagged = || accidents.iter().filter(|a| a.false_positive);

    FalsePositiveTrends {
        by_location: ranked(flagged().map(|a| a.location.as_str()))
            .into_iter()
            .map(|(location, count)| LocationCount { location, count })
            .collect(),
        by_camera_id: ranked(flagged().map(|a| a.camera_id.as_str()))
            .into_iter()
            .map(|(camera_id, count)| CameraCount { camera_id, count })
            .collect(),
    }
}

/// `100 * part / total` to one decimal; `0.0` when `total` is zero.
fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = 100.0 * part as f64 / total as f64;
    (raw * 10.0).round() / 10.0
}

/// Histogram sorted descending by count; ties keep first-seen order.
fn ranked<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    // First-seen order, so the stable sort below breaks ties by appearance.
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut ranked: Vec<(String, usize)> = Vec::new();
    for key in keys {
        let slot = *slots.entry(key).or_insert_with(|| {
            ranked.push((key.to_string(), 0));
            ranked.len() - 1
        });
        ranked[slot].1 += 1;
    }
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

fn buckets<K: Ord>(map: BTreeMap<K, usize>) -> Vec<BucketCount<K>> {
    map.into_iter()
        .map(|(bucket, count)| BucketCount { bucket, count })
        .collect()
}
