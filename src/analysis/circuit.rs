//! Circuit metrics and reactive power correction sizing
//!
//! The station's operating point is the complex power built from the
//! *averaged* real and reactive power (average, then combine). Its power
//! factor generally differs from the mean of per-sample power factors
//! reported by [`super::quality`].
//!
//! Correction sizing follows the usual capacitor-bank formula:
//!
//! ```text
//! Q_target   = P_avg * tan(acos(pf_target))
//! Q_correct  = max(0, Q_avg - Q_target)
//! pf_after   = P_avg / |P_avg + j(Q_avg - Q_correct)|
//! ```
//!
//! Correction is never negative, so a station already at or better than
//! the target (including a leading one) needs none.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregate::{self, field_values};
use super::grouping::group_by_station;
use crate::domain::{GridStandards, MeasuredField, Measurement, MeasurementTable};

/// kVAr per MVAr
pub const KVAR_PER_MVAR: f64 = 1000.0;

/// Per-station RMS values, operating point and correction requirement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitMetrics {
    pub station_id: String,
    pub rms_voltage_pu: Option<f64>,
    pub rms_current_pu: Option<f64>,
    pub avg_real_power_mw: Option<f64>,
    pub avg_reactive_power_mvar: Option<f64>,
    /// Power factor of the averaged complex power
    pub existing_power_factor: Option<f64>,
    pub existing_phase_angle_deg: Option<f64>,
    /// Target clamped to [0, 1]
    pub target_power_factor: f64,
    pub target_phase_angle_deg: f64,
    pub required_reactive_correction_mvar: Option<f64>,
    pub capacitor_bank_kvar: Option<f64>,
    pub expected_power_factor: Option<f64>,
}

/// Target power factor clamped to [0, 1] and its phase angle in radians.
///
/// A degenerate target (zero or NaN) yields a zero angle, meaning no
/// correction target. NaN is reported as 0.0.
pub fn target_operating_point(power_factor_target: f64) -> (f64, f64) {
    if power_factor_target.is_nan() {
        return (0.0, 0.0);
    }
    let target = power_factor_target.clamp(0.0, 1.0);
    if target > 0.0 && target <= 1.0 {
        (target, target.acos())
    } else {
        (target, 0.0)
    }
}

/// Power factor `P / |S|`, undefined when apparent power is zero
fn power_factor_of(power: Complex64) -> Option<f64> {
    let apparent = power.norm();
    if apparent > 0.0 {
        Some(power.re / apparent)
    } else {
        None
    }
}

/// Reactive power (MVAr) to add to reach the target angle; zero or more
pub fn required_correction(avg_real_mw: f64, avg_reactive_mvar: f64, target_angle_rad: f64) -> f64 {
    let target_reactive = if avg_real_mw == 0.0 {
        0.0
    } else {
        avg_real_mw * target_angle_rad.tan()
    };
    (avg_reactive_mvar - target_reactive).max(0.0)
}

impl CircuitMetrics {
    fn from_rows(station_id: &str, rows: &[&Measurement], standards: &GridStandards) -> Self {
        let voltage = field_values(rows, MeasuredField::VoltagePu);
        let current = field_values(rows, MeasuredField::CurrentPu);
        let avg_real = aggregate::mean(&field_values(rows, MeasuredField::RealPowerMw));
        let avg_reactive = aggregate::mean(&field_values(rows, MeasuredField::ReactivePowerMvar));

        let (target_pf, target_angle) = target_operating_point(standards.power_factor_target);

        let operating_point = match (avg_real, avg_reactive) {
            (Some(p), Some(q)) => Some(Complex64::new(p, q)),
            _ => None,
        };
        let existing_power_factor = operating_point.and_then(power_factor_of);
        let existing_phase_angle_deg = operating_point
            .filter(|s| s.norm() > 0.0)
            .map(|s| s.arg().to_degrees());

        let correction = operating_point.map(|s| required_correction(s.re, s.im, target_angle));
        let expected_power_factor = operating_point
            .zip(correction)
            .and_then(|(s, q_c)| power_factor_of(Complex64::new(s.re, s.im - q_c)));

        Self {
            station_id: station_id.to_string(),
            rms_voltage_pu: aggregate::rms(&voltage),
            rms_current_pu: aggregate::rms(&current),
            avg_real_power_mw: avg_real,
            avg_reactive_power_mvar: avg_reactive,
            existing_power_factor,
            existing_phase_angle_deg,
            target_power_factor: target_pf,
            target_phase_angle_deg: target_angle.to_degrees(),
            required_reactive_correction_mvar: correction,
            capacitor_bank_kvar: correction.map(|q_c| q_c * KVAR_PER_MVAR),
            expected_power_factor,
        }
    }
}

/// RMS values and capacitor bank sizing per station
pub fn calculate_circuit_metrics(
    table: &MeasurementTable,
    standards: &GridStandards,
) -> Vec<CircuitMetrics> {
    let rows: Vec<_> = group_by_station(table)
        .into_iter()
        .map(|(station, group)| CircuitMetrics::from_rows(station, &group, standards))
        .collect();
    debug!(
        stations = rows.len(),
        target_pf = standards.power_factor_target,
        "computed circuit metrics"
    );
    rows
}
