//! Per-station descriptive statistics

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::aggregate::{self, field_values};
use super::display_value;
use super::grouping::group_by_station;
use crate::domain::{MeasuredField, Measurement, MeasurementTable};

/// Central tendency and dispersion of one measured field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation, undefined for a single sample
    pub std: Option<f64>,
}

impl FieldSummary {
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            mean: aggregate::mean(values),
            median: aggregate::median(values),
            std: aggregate::sample_std(values),
        }
    }
}

/// One row of the statistics table: mean, median and std for each field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationStatistics {
    pub station_id: String,
    pub voltage_pu_mean: Option<f64>,
    pub voltage_pu_median: Option<f64>,
    pub voltage_pu_std: Option<f64>,
    pub current_pu_mean: Option<f64>,
    pub current_pu_median: Option<f64>,
    pub current_pu_std: Option<f64>,
    pub real_power_mw_mean: Option<f64>,
    pub real_power_mw_median: Option<f64>,
    pub real_power_mw_std: Option<f64>,
    pub reactive_power_mvar_mean: Option<f64>,
    pub reactive_power_mvar_median: Option<f64>,
    pub reactive_power_mvar_std: Option<f64>,
    pub power_factor_mean: Option<f64>,
    pub power_factor_median: Option<f64>,
    pub power_factor_std: Option<f64>,
}

impl StationStatistics {
    fn from_rows(station_id: &str, rows: &[&Measurement]) -> Self {
        let summarize = |field| FieldSummary::from_values(&field_values(rows, field));
        let voltage = summarize(MeasuredField::VoltagePu);
        let current = summarize(MeasuredField::CurrentPu);
        let real = summarize(MeasuredField::RealPowerMw);
        let reactive = summarize(MeasuredField::ReactivePowerMvar);
        let pf = summarize(MeasuredField::PowerFactor);

        Self {
            station_id: station_id.to_string(),
            voltage_pu_mean: voltage.mean,
            voltage_pu_median: voltage.median,
            voltage_pu_std: voltage.std,
            current_pu_mean: current.mean,
            current_pu_median: current.median,
            current_pu_std: current.std,
            real_power_mw_mean: real.mean,
            real_power_mw_median: real.median,
            real_power_mw_std: real.std,
            reactive_power_mvar_mean: reactive.mean,
            reactive_power_mvar_median: reactive.median,
            reactive_power_mvar_std: reactive.std,
            power_factor_mean: pf.mean,
            power_factor_median: pf.median,
            power_factor_std: pf.std,
        }
    }

    /// Summary for a single field
    pub fn summary(&self, field: MeasuredField) -> FieldSummary {
        let (mean, median, std) = match field {
            MeasuredField::VoltagePu => (self.voltage_pu_mean, self.voltage_pu_median, self.voltage_pu_std),
            MeasuredField::CurrentPu => (self.current_pu_mean, self.current_pu_median, self.current_pu_std),
            MeasuredField::RealPowerMw => (
                self.real_power_mw_mean,
                self.real_power_mw_median,
                self.real_power_mw_std,
            ),
            MeasuredField::ReactivePowerMvar => (
                self.reactive_power_mvar_mean,
                self.reactive_power_mvar_median,
                self.reactive_power_mvar_std,
            ),
            MeasuredField::PowerFactor => (
                self.power_factor_mean,
                self.power_factor_median,
                self.power_factor_std,
            ),
        };
        FieldSummary { mean, median, std }
    }
}

impl fmt::Display for StationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: V={} pu | I={} pu | P={} MW | PF={}",
            self.station_id,
            display_value(self.voltage_pu_mean, 3),
            display_value(self.current_pu_mean, 1),
            display_value(self.real_power_mw_mean, 1),
            display_value(self.power_factor_mean, 3),
        )
    }
}

/// Mean, median and sample standard deviation of every measured field, per station
pub fn calculate_basic_statistics(table: &MeasurementTable) -> Vec<StationStatistics> {
    let rows: Vec<_> = group_by_station(table)
        .into_iter()
        .map(|(station, group)| StationStatistics::from_rows(station, &group))
        .collect();
    debug!(stations = rows.len(), "computed basic statistics");
    rows
}
