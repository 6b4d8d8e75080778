use serde::{Deserialize, Serialize};

/// Thresholds a station is judged against.
///
/// Normal bands drive compliance percentages, fault bands drive event
/// counting. No ordering between the two is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridStandards {
    /// Lower edge of the normal voltage band (pu)
    pub voltage_min: f64,
    /// Upper edge of the normal voltage band (pu)
    pub voltage_max: f64,
    /// Voltage below this is a sag (pu)
    pub voltage_fault_min: f64,
    /// Voltage above this is a swell (pu)
    pub voltage_fault_max: f64,
    /// Current above this is an over-current (pu)
    pub current_max: f64,
    /// Minimum compliant power factor
    pub power_factor_min: f64,
    /// Power factor below this is a fault-level condition
    pub power_factor_fault: f64,
    /// Power factor that reactive correction is sized for
    pub power_factor_target: f64,
}

impl Default for GridStandards {
    fn default() -> Self {
        Self {
            voltage_min: 0.95,
            voltage_max: 1.05,
            voltage_fault_min: 0.90,
            voltage_fault_max: 1.10,
            current_max: 120.0,
            power_factor_min: 0.90,
            power_factor_fault: 0.80,
            power_factor_target: 0.95,
        }
    }
}

impl GridStandards {
    /// Voltage inside the inclusive normal band
    pub fn voltage_within_band(&self, voltage_pu: f64) -> bool {
        voltage_pu >= self.voltage_min && voltage_pu <= self.voltage_max
    }

    pub fn power_factor_compliant(&self, power_factor: f64) -> bool {
        power_factor >= self.power_factor_min
    }

    pub fn current_within_limit(&self, current_pu: f64) -> bool {
        current_pu <= self.current_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let standards = GridStandards::default();
        assert_eq!(standards.voltage_min, 0.95);
        assert_eq!(standards.voltage_fault_max, 1.10);
        assert_eq!(standards.current_max, 120.0);
        assert_eq!(standards.power_factor_target, 0.95);
    }

    #[test]
    fn test_voltage_band_is_inclusive() {
        let standards = GridStandards::default();
        assert!(standards.voltage_within_band(0.95));
        assert!(standards.voltage_within_band(1.05));
        assert!(!standards.voltage_within_band(0.949));
        assert!(!standards.voltage_within_band(f64::NAN));
    }

    #[test]
    fn test_limits_reject_nan() {
        let standards = GridStandards::default();
        assert!(standards.power_factor_compliant(0.90));
        assert!(!standards.power_factor_compliant(f64::NAN));
        assert!(standards.current_within_limit(120.0));
        assert!(!standards.current_within_limit(f64::NAN));
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let standards: GridStandards =
            serde_json::from_str(r#"{ "power_factor_target": 0.98 }"#).unwrap();
        assert_eq!(standards.power_factor_target, 0.98);
        assert_eq!(standards.voltage_max, 1.05);
    }
}
