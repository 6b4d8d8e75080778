pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod report;
pub mod telemetry;

pub use error::{AnalyticsError, AnalyticsResult};
