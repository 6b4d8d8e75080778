//! Load pattern extraction
//!
//! Three independent views of each station's real and reactive power:
//! calendar-day and week resampling (trend) and an hour-of-day profile
//! (diurnal shape). The hourly profile discards the date, so it is never
//! derived from the resampled series.

use chrono::{Datelike, Days, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::aggregate;
use super::grouping::group_by_station;
use crate::domain::{Measurement, MeasurementTable};

/// Resampling resolution for the trend views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Calendar day, labelled by its date
    Daily,
    /// Monday through Sunday, labelled by the closing Sunday
    Weekly,
}

impl Resolution {
    /// Label of the bucket containing `date`
    pub fn bucket(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Resolution::Daily => date,
            Resolution::Weekly => {
                let to_sunday = 6 - date.weekday().num_days_from_monday();
                date.checked_add_days(Days::new(u64::from(to_sunday)))
                    .unwrap_or(date)
            }
        }
    }

    fn step(&self) -> Days {
        match self {
            Resolution::Daily => Days::new(1),
            Resolution::Weekly => Days::new(7),
        }
    }
}

/// Mean power of one station over one day or week.
///
/// Buckets without samples are kept (zero count, missing means) so the
/// series has no gaps between a station's first and last sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodLoad {
    pub station_id: String,
    pub period: NaiveDate,
    pub sample_count: usize,
    pub mean_real_power_mw: Option<f64>,
    pub mean_reactive_power_mvar: Option<f64>,
}

/// Mean power of one station at one hour of day across the whole window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyLoad {
    pub station_id: String,
    /// Hour of day (0-23)
    pub hour: u32,
    pub sample_count: usize,
    pub mean_real_power_mw: Option<f64>,
    pub mean_reactive_power_mvar: Option<f64>,
}

/// Daily, weekly and hour-of-day load views for every station
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadPatterns {
    pub daily: Vec<PeriodLoad>,
    pub weekly: Vec<PeriodLoad>,
    pub hourly_profile: Vec<HourlyLoad>,
}

#[derive(Default)]
struct PowerBucket {
    real: Vec<f64>,
    reactive: Vec<f64>,
}

impl PowerBucket {
    fn push(&mut self, measurement: &Measurement) {
        self.real.push(measurement.real_power_mw);
        self.reactive.push(measurement.reactive_power_mvar);
    }

    fn len(&self) -> usize {
        self.real.len()
    }
}

/// Capture daily, weekly and diurnal load signatures for each station
pub fn identify_load_patterns(table: &MeasurementTable) -> LoadPatterns {
    let mut patterns = LoadPatterns::default();

    for (station, rows) in group_by_station(table) {
        patterns
            .daily
            .extend(resample(station, &rows, Resolution::Daily));
        patterns
            .weekly
            .extend(resample(station, &rows, Resolution::Weekly));
        patterns.hourly_profile.extend(hourly_profile(station, &rows));
    }

    debug!(
        daily = patterns.daily.len(),
        weekly = patterns.weekly.len(),
        hourly = patterns.hourly_profile.len(),
        "extracted load patterns"
    );
    patterns
}

/// Resample one station's rows into contiguous buckets
pub fn resample(station: &str, rows: &[&Measurement], resolution: Resolution) -> Vec<PeriodLoad> {
    let mut buckets: BTreeMap<NaiveDate, PowerBucket> = BTreeMap::new();
    for measurement in rows {
        let label = resolution.bucket(measurement.timestamp.date());
        buckets.entry(label).or_default().push(measurement);
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let mut cursor = first;
    while cursor <= last {
        let row = match buckets.get(&cursor) {
            Some(bucket) => PeriodLoad {
                station_id: station.to_string(),
                period: cursor,
                sample_count: bucket.len(),
                mean_real_power_mw: aggregate::mean(&bucket.real),
                mean_reactive_power_mvar: aggregate::mean(&bucket.reactive),
            },
            None => PeriodLoad {
                station_id: station.to_string(),
                period: cursor,
                sample_count: 0,
                mean_real_power_mw: None,
                mean_reactive_power_mvar: None,
            },
        };
        series.push(row);

        match cursor.checked_add_days(resolution.step()) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    series
}

/// Mean power by hour of day, only for hours that have samples
pub fn hourly_profile(station: &str, rows: &[&Measurement]) -> Vec<HourlyLoad> {
    let mut hours: BTreeMap<u32, PowerBucket> = BTreeMap::new();
    for measurement in rows {
        hours
            .entry(measurement.timestamp.hour())
            .or_default()
            .push(measurement);
    }

    hours
        .into_iter()
        .map(|(hour, bucket)| HourlyLoad {
            station_id: station.to_string(),
            hour,
            sample_count: bucket.len(),
            mean_real_power_mw: aggregate::mean(&bucket.real),
            mean_reactive_power_mvar: aggregate::mean(&bucket.reactive),
        })
        .collect()
}
