use chrono::NaiveDateTime;
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::debug;

use super::grouping::group_by_station;
use crate::domain::{GridStandards, Measurement, MeasurementTable};

/// Fault-level threshold breaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FaultKind {
    /// Voltage below `voltage_fault_min`
    VoltageSag,
    /// Voltage above `voltage_fault_max`
    VoltageSwell,
    /// Current above `current_max`
    OverCurrent,
    /// Power factor below `power_factor_fault`
    VeryLowPowerFactor,
}

impl FaultKind {
    /// Whether this sample breaches the threshold. Never true for NaN.
    pub fn is_triggered(&self, measurement: &Measurement, standards: &GridStandards) -> bool {
        match self {
            FaultKind::VoltageSag => measurement.voltage_pu < standards.voltage_fault_min,
            FaultKind::VoltageSwell => measurement.voltage_pu > standards.voltage_fault_max,
            FaultKind::OverCurrent => measurement.current_pu > standards.current_max,
            FaultKind::VeryLowPowerFactor => {
                measurement.power_factor < standards.power_factor_fault
            }
        }
    }
}

/// Event counts per fault kind and the span of all faulted samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultSummary {
    pub station_id: String,
    pub voltage_sag_events: usize,
    pub voltage_swell_events: usize,
    pub over_current_events: usize,
    pub very_low_pf_events: usize,
    /// Earliest timestamp across all four kinds; absent when nothing fired
    pub first_fault: Option<NaiveDateTime>,
    pub last_fault: Option<NaiveDateTime>,
}

impl FaultSummary {
    fn from_rows(station_id: &str, rows: &[&Measurement], standards: &GridStandards) -> Self {
        let count = |kind: FaultKind| {
            rows.iter()
                .filter(|m| kind.is_triggered(m, standards))
                .count()
        };

        // A sample breaching several thresholds contributes its timestamp once per kind
        let span = FaultKind::iter()
            .flat_map(|kind| {
                rows.iter()
                    .filter(move |m| kind.is_triggered(m, standards))
                    .map(|m| m.timestamp)
            })
            .minmax();
        let (first_fault, last_fault) = match span {
            MinMaxResult::NoElements => (None, None),
            MinMaxResult::OneElement(ts) => (Some(ts), Some(ts)),
            MinMaxResult::MinMax(first, last) => (Some(first), Some(last)),
        };

        Self {
            station_id: station_id.to_string(),
            voltage_sag_events: count(FaultKind::VoltageSag),
            voltage_swell_events: count(FaultKind::VoltageSwell),
            over_current_events: count(FaultKind::OverCurrent),
            very_low_pf_events: count(FaultKind::VeryLowPowerFactor),
            first_fault,
            last_fault,
        }
    }

    pub fn events(&self, kind: FaultKind) -> usize {
        match kind {
            FaultKind::VoltageSag => self.voltage_sag_events,
            FaultKind::VoltageSwell => self.voltage_swell_events,
            FaultKind::OverCurrent => self.over_current_events,
            FaultKind::VeryLowPowerFactor => self.very_low_pf_events,
        }
    }

    pub fn total_events(&self) -> usize {
        FaultKind::iter().map(|kind| self.events(kind)).sum()
    }
}

impl fmt::Display for FaultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = |ts: Option<NaiveDateTime>| {
            ts.map(|ts| ts.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        write!(
            f,
            "{}: Sag {} | Swell {} | Overcurrent {} | Very low PF {} | First {} | Last {}",
            self.station_id,
            self.voltage_sag_events,
            self.voltage_swell_events,
            self.over_current_events,
            self.very_low_pf_events,
            day(self.first_fault),
            day(self.last_fault)
        )
    }
}

/// Surface fault indicators based on threshold breaches
pub fn perform_fault_analysis(
    table: &MeasurementTable,
    standards: &GridStandards,
) -> Vec<FaultSummary> {
    let rows: Vec<_> = group_by_station(table)
        .into_iter()
        .map(|(station, group)| FaultSummary::from_rows(station, &group, standards))
        .collect();
    debug!(
        stations = rows.len(),
        faulted = rows.iter().filter(|r| r.first_fault.is_some()).count(),
        "performed fault analysis"
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(day: u32, hour: u32, voltage: f64, current: f64, pf: f64) -> Measurement {
        Measurement {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            station_id: "SUB_001".to_string(),
            voltage_pu: voltage,
            current_pu: current,
            real_power_mw: 80.0,
            reactive_power_mvar: 30.0,
            power_factor: pf,
        }
    }

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_counts_each_kind() {
        let table = MeasurementTable::new(vec![
            sample(14, 0, 1.00, 50.0, 0.95),
            sample(15, 3, 0.80, 50.0, 0.95),
            sample(15, 4, 1.12, 130.0, 0.95),
            sample(16, 5, 1.00, 50.0, 0.75),
            sample(17, 6, 0.85, 125.0, 0.70),
        ]);
        let summary = &perform_fault_analysis(&table, &GridStandards::default())[0];

        assert_eq!(summary.voltage_sag_events, 2);
        assert_eq!(summary.voltage_swell_events, 1);
        assert_eq!(summary.over_current_events, 2);
        assert_eq!(summary.very_low_pf_events, 2);
        assert_eq!(summary.total_events(), 7);
        assert_eq!(summary.first_fault, Some(ts(15, 3)));
        assert_eq!(summary.last_fault, Some(ts(17, 6)));
    }

    #[test]
    fn test_single_fault_sets_both_ends() {
        let mut rows: Vec<_> = (0..24).map(|h| sample(15, h, 1.0, 50.0, 0.95)).collect();
        rows[9].voltage_pu = 0.80;
        let table = MeasurementTable::new(rows);
        let summary = &perform_fault_analysis(&table, &GridStandards::default())[0];

        assert_eq!(summary.voltage_sag_events, 1);
        assert_eq!(summary.first_fault, Some(ts(15, 9)));
        assert_eq!(summary.last_fault, Some(ts(15, 9)));
    }

    #[test]
    fn test_no_faults_reports_absent_span() {
        let table = MeasurementTable::new(vec![sample(1, 0, 1.0, 50.0, 0.97)]);
        let summary = &perform_fault_analysis(&table, &GridStandards::default())[0];

        assert_eq!(summary.total_events(), 0);
        assert_eq!(summary.first_fault, None);
        assert_eq!(summary.last_fault, None);
        assert_eq!(
            summary.to_string(),
            "SUB_001: Sag 0 | Swell 0 | Overcurrent 0 | Very low PF 0 | First - | Last -"
        );
    }

    #[test]
    fn test_nan_never_triggers() {
        let m = sample(1, 0, f64::NAN, f64::NAN, f64::NAN);
        let standards = GridStandards::default();
        assert!(FaultKind::iter().all(|kind| !kind.is_triggered(&m, &standards)));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(FaultKind::VoltageSag.to_string(), "voltage_sag");
        assert_eq!(FaultKind::VeryLowPowerFactor.to_string(), "very_low_power_factor");
    }
}
