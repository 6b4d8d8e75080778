pub mod aggregate;
pub mod circuit;
pub mod compliance;
pub mod faults;
pub(crate) mod grouping;
pub mod load_patterns;
pub mod quality;
pub mod statistics;

pub use circuit::*;
pub use compliance::*;
pub use faults::*;
pub use load_patterns::*;
pub use quality::*;
pub use statistics::*;

/// Fixed-precision rendering of an optional value, `-` when undefined
pub(crate) fn display_value(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}
