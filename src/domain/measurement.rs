use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumIter, IntoStaticStr};

/// One sample from a monitoring station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub timestamp: NaiveDateTime,
    pub station_id: String,
    /// Bus voltage (pu)
    pub voltage_pu: f64,
    /// Line current (pu)
    pub current_pu: f64,
    /// Real power (MW)
    pub real_power_mw: f64,
    /// Reactive power (MVAr)
    pub reactive_power_mvar: f64,
    /// Power factor, typically in (0, 1]
    pub power_factor: f64,
}

impl Measurement {
    /// Value of one of the five measured fields
    pub fn value(&self, field: MeasuredField) -> f64 {
        match field {
            MeasuredField::VoltagePu => self.voltage_pu,
            MeasuredField::CurrentPu => self.current_pu,
            MeasuredField::RealPowerMw => self.real_power_mw,
            MeasuredField::ReactivePowerMvar => self.reactive_power_mvar,
            MeasuredField::PowerFactor => self.power_factor,
        }
    }

    /// False for rows whose station id was blank or a NaN spelling
    pub fn has_station(&self) -> bool {
        !self.station_id.is_empty()
    }

    /// True when any measured field is NaN
    pub fn has_missing_values(&self) -> bool {
        use strum::IntoEnumIterator;
        MeasuredField::iter().any(|field| self.value(field).is_nan())
    }
}

/// The numeric columns of the measurement table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum MeasuredField {
    VoltagePu,
    CurrentPu,
    RealPowerMw,
    ReactivePowerMvar,
    PowerFactor,
}

impl MeasuredField {
    /// Column header used in measurement files
    pub fn column(&self) -> &'static str {
        (*self).into()
    }
}

/// Measurements sorted ascending by timestamp.
///
/// Sorting is stable, so samples sharing a timestamp keep their original
/// relative order. The table is not partitioned by station.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementTable {
    rows: Vec<Measurement>,
}

impl MeasurementTable {
    pub fn new(mut rows: Vec<Measurement>) -> Self {
        rows.sort_by_key(|m| m.timestamp);
        Self { rows }
    }

    pub fn rows(&self) -> &[Measurement] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct station identifiers in ascending order, unassigned rows excluded
    pub fn station_ids(&self) -> BTreeSet<&str> {
        self.rows
            .iter()
            .filter(|m| m.has_station())
            .map(|m| m.station_id.as_str())
            .collect()
    }
}

impl FromIterator<Measurement> for MeasurementTable {
    fn from_iter<I: IntoIterator<Item = Measurement>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MeasurementTable {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
