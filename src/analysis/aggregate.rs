//! Named aggregations applied per station
//!
//! NaN samples are skipped by every aggregation here. An aggregation over no
//! usable samples is `None`, never zero.

use statrs::statistics::{Data, Median, Statistics};

use crate::domain::{MeasuredField, Measurement};

/// Values of one field across a station's samples, in row order
pub fn field_values(rows: &[&Measurement], field: MeasuredField) -> Vec<f64> {
    rows.iter().map(|m| m.value(field)).collect()
}

fn usable(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    let values = usable(values);
    if values.is_empty() {
        return None;
    }
    defined(Statistics::mean(values.iter()))
}

pub fn median(values: &[f64]) -> Option<f64> {
    let values = usable(values);
    if values.is_empty() {
        return None;
    }
    defined(Data::new(values).median())
}

/// Sample standard deviation (N-1 denominator); undefined below two samples
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let values = usable(values);
    if values.len() < 2 {
        return None;
    }
    defined(Statistics::std_dev(values.iter()))
}

pub fn min(values: &[f64]) -> Option<f64> {
    let values = usable(values);
    if values.is_empty() {
        return None;
    }
    Some(Statistics::min(values.iter()))
}

pub fn max(values: &[f64]) -> Option<f64> {
    let values = usable(values);
    if values.is_empty() {
        return None;
    }
    Some(Statistics::max(values.iter()))
}

/// Root mean square (quadratic mean)
pub fn rms(values: &[f64]) -> Option<f64> {
    let values = usable(values);
    if values.is_empty() {
        return None;
    }
    defined(Statistics::quadratic_mean(values.iter()))
}

/// Percentage of all samples (NaN included in the denominator) satisfying
/// `predicate`. A NaN sample only counts when the predicate accepts NaN.
pub fn percentage_where<F>(values: &[f64], predicate: F) -> f64
where
    F: Fn(f64) -> bool,
{
    if values.is_empty() {
        return f64::NAN;
    }
    let hits = values.iter().filter(|v| predicate(**v)).count();
    hits as f64 / values.len() as f64 * 100.0
}

/// `numerator / denominator`, undefined when the denominator is zero or
/// either side is missing
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => defined(n / d),
        _ => None,
    }
}
