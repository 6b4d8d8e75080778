//! Power quality indices
//!
//! Apparent power and phase angle are taken per sample from the complex
//! power `S = P + jQ`, then averaged. This is the "average of instantaneous
//! values" view; [`super::circuit`] answers the aggregate-load question by
//! averaging P and Q first.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::aggregate::{self, field_values};
use super::display_value;
use super::grouping::group_by_station;
use crate::domain::{GridStandards, MeasuredField, Measurement, MeasurementTable};

/// Per-station power quality summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerQualityIndex {
    pub station_id: String,
    pub avg_power_factor: Option<f64>,
    pub min_power_factor: Option<f64>,
    /// Percentage of samples below `power_factor_min`
    pub low_power_factor_pct: f64,
    /// Percentage of samples below `power_factor_fault`
    pub very_low_power_factor_pct: f64,
    /// Mean of |V - 1.0| (pu)
    pub avg_voltage_deviation: Option<f64>,
    pub voltage_std: Option<f64>,
    pub avg_apparent_power_mva: Option<f64>,
    pub avg_phase_angle_deg: Option<f64>,
    pub phase_angle_std_deg: Option<f64>,
    pub peak_demand_mw: Option<f64>,
    pub avg_demand_mw: Option<f64>,
    pub avg_reactive_power_mvar: Option<f64>,
    /// Average over peak real power
    pub load_factor: Option<f64>,
    /// Average reactive over average real power
    pub kvar_to_kw_ratio: Option<f64>,
}

/// Complex power of a single sample
pub fn complex_power(measurement: &Measurement) -> Complex64 {
    Complex64::new(measurement.real_power_mw, measurement.reactive_power_mvar)
}

impl PowerQualityIndex {
    fn from_rows(station_id: &str, rows: &[&Measurement], standards: &GridStandards) -> Self {
        let power_factor = field_values(rows, MeasuredField::PowerFactor);
        let voltage = field_values(rows, MeasuredField::VoltagePu);
        let real = field_values(rows, MeasuredField::RealPowerMw);
        let reactive = field_values(rows, MeasuredField::ReactivePowerMvar);

        let powers: Vec<Complex64> = rows.iter().map(|m| complex_power(m)).collect();
        let apparent: Vec<f64> = powers.iter().map(|s| s.norm()).collect();
        let angle_deg: Vec<f64> = powers.iter().map(|s| s.arg().to_degrees()).collect();
        let deviation: Vec<f64> = voltage.iter().map(|v| (v - 1.0).abs()).collect();

        let peak_demand_mw = aggregate::max(&real);
        let avg_demand_mw = aggregate::mean(&real);
        let avg_reactive_power_mvar = aggregate::mean(&reactive);

        Self {
            station_id: station_id.to_string(),
            avg_power_factor: aggregate::mean(&power_factor),
            min_power_factor: aggregate::min(&power_factor),
            low_power_factor_pct: aggregate::percentage_where(&power_factor, |pf| {
                pf < standards.power_factor_min
            }),
            very_low_power_factor_pct: aggregate::percentage_where(&power_factor, |pf| {
                pf < standards.power_factor_fault
            }),
            avg_voltage_deviation: aggregate::mean(&deviation),
            voltage_std: aggregate::sample_std(&voltage),
            avg_apparent_power_mva: aggregate::mean(&apparent),
            avg_phase_angle_deg: aggregate::mean(&angle_deg),
            phase_angle_std_deg: aggregate::sample_std(&angle_deg),
            peak_demand_mw,
            avg_demand_mw,
            avg_reactive_power_mvar,
            load_factor: aggregate::ratio(avg_demand_mw, peak_demand_mw),
            kvar_to_kw_ratio: aggregate::ratio(avg_reactive_power_mvar, avg_demand_mw),
        }
    }
}

impl fmt::Display for PowerQualityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Avg PF {} (min {}) | Voltage std {} pu | Low PF hrs {:.1}%",
            self.station_id,
            display_value(self.avg_power_factor, 3),
            display_value(self.min_power_factor, 3),
            display_value(self.voltage_std, 4),
            self.low_power_factor_pct
        )
    }
}

/// Compute power quality metrics for each station
pub fn calculate_power_quality_indices(
    table: &MeasurementTable,
    standards: &GridStandards,
) -> Vec<PowerQualityIndex> {
    let rows: Vec<_> = group_by_station(table)
        .into_iter()
        .map(|(station, group)| PowerQualityIndex::from_rows(station, &group, standards))
        .collect();
    debug!(stations = rows.len(), "computed power quality indices");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(hour: u32, voltage: f64, real: f64, reactive: f64, pf: f64) -> Measurement {
        Measurement {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            station_id: "SUB_001".to_string(),
            voltage_pu: voltage,
            current_pu: 60.0,
            real_power_mw: real,
            reactive_power_mvar: reactive,
            power_factor: pf,
        }
    }

    fn close(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_indices_from_complex_power() {
        let table = MeasurementTable::new(vec![
            sample(0, 1.02, 3.0, 4.0, 0.85),
            sample(1, 0.98, 6.0, 8.0, 0.75),
            sample(2, 1.00, 9.0, 0.0, 0.95),
        ]);
        let index = &calculate_power_quality_indices(&table, &GridStandards::default())[0];

        // |3+4j| = 5, |6+8j| = 10, |9| = 9
        assert!(close(index.avg_apparent_power_mva, 8.0));
        let angle = 4.0f64.atan2(3.0).to_degrees();
        assert!(close(index.avg_phase_angle_deg, (2.0 * angle) / 3.0));
        assert!(close(index.avg_voltage_deviation, 0.04 / 3.0));
        assert!(close(index.peak_demand_mw, 9.0));
        assert!(close(index.avg_demand_mw, 6.0));
        assert!(close(index.load_factor, 6.0 / 9.0));
        assert!(close(index.kvar_to_kw_ratio, 4.0 / 6.0));
        assert!((index.low_power_factor_pct - 200.0 / 3.0).abs() < 1e-9);
        assert!((index.very_low_power_factor_pct - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(index.min_power_factor, Some(0.75));
    }

    #[test]
    fn test_zero_real_power_leaves_ratios_undefined() {
        let table = MeasurementTable::new(vec![
            sample(0, 1.0, 0.0, 5.0, 0.0),
            sample(1, 1.0, 0.0, 3.0, 0.0),
        ]);
        let index = &calculate_power_quality_indices(&table, &GridStandards::default())[0];

        assert_eq!(index.peak_demand_mw, Some(0.0));
        assert_eq!(index.load_factor, None);
        assert_eq!(index.kvar_to_kw_ratio, None);
        assert!(close(index.avg_phase_angle_deg, 90.0));
    }

    #[test]
    fn test_leading_reactive_power_gives_negative_angle() {
        let table = MeasurementTable::new(vec![sample(0, 1.0, 10.0, -10.0, 0.7071)]);
        let index = &calculate_power_quality_indices(&table, &GridStandards::default())[0];
        assert!(close(index.avg_phase_angle_deg, -45.0));
        assert_eq!(index.phase_angle_std_deg, None);
        assert_eq!(index.voltage_std, None);
    }
}
