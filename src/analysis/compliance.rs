use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::aggregate::{self, field_values};
use super::grouping::group_by_station;
use crate::domain::{GridStandards, MeasuredField, Measurement, MeasurementTable};

/// Share of a station's samples inside each normal operating band.
///
/// Percentages are relative to the station's own sample count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationCompliance {
    pub station_id: String,
    pub voltage_within_pct: f64,
    pub power_factor_within_pct: f64,
    pub current_within_pct: f64,
    pub voltage_min_observed: Option<f64>,
    pub voltage_max_observed: Option<f64>,
    pub current_max_observed: Option<f64>,
    pub power_factor_min_observed: Option<f64>,
}

impl StationCompliance {
    fn from_rows(station_id: &str, rows: &[&Measurement], standards: &GridStandards) -> Self {
        let voltage = field_values(rows, MeasuredField::VoltagePu);
        let current = field_values(rows, MeasuredField::CurrentPu);
        let power_factor = field_values(rows, MeasuredField::PowerFactor);

        Self {
            station_id: station_id.to_string(),
            voltage_within_pct: aggregate::percentage_where(&voltage, |v| {
                standards.voltage_within_band(v)
            }),
            power_factor_within_pct: aggregate::percentage_where(&power_factor, |pf| {
                standards.power_factor_compliant(pf)
            }),
            current_within_pct: aggregate::percentage_where(&current, |i| {
                standards.current_within_limit(i)
            }),
            voltage_min_observed: aggregate::min(&voltage),
            voltage_max_observed: aggregate::max(&voltage),
            current_max_observed: aggregate::max(&current),
            power_factor_min_observed: aggregate::min(&power_factor),
        }
    }

    /// True when every sample sits inside all three bands
    pub fn is_fully_compliant(&self) -> bool {
        self.voltage_within_pct >= 100.0
            && self.power_factor_within_pct >= 100.0
            && self.current_within_pct >= 100.0
    }
}

impl fmt::Display for StationCompliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Voltage {:.1}% | PF {:.1}% | Current {:.1}%",
            self.station_id,
            self.voltage_within_pct,
            self.power_factor_within_pct,
            self.current_within_pct
        )
    }
}

/// Quantify compliance against the grid standards per station
pub fn compare_to_standards(
    table: &MeasurementTable,
    standards: &GridStandards,
) -> Vec<StationCompliance> {
    let rows: Vec<_> = group_by_station(table)
        .into_iter()
        .map(|(station, group)| StationCompliance::from_rows(station, &group, standards))
        .collect();
    debug!(stations = rows.len(), "compared stations to standards");
    rows
}
