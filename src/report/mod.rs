//! Bundles every derived table and writes them out
//!
//! CSV export writes one file per table into a directory. Undefined values
//! become empty cells. A table with no rows still gets its header row.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analysis::{
    calculate_basic_statistics, calculate_circuit_metrics, calculate_power_quality_indices,
    compare_to_standards, identify_load_patterns, perform_fault_analysis, CircuitMetrics,
    FaultSummary, LoadPatterns, PowerQualityIndex, StationCompliance, StationStatistics,
};
use crate::domain::{GridStandards, MeasurementTable};
use crate::error::AnalyticsResult;

pub const BASIC_STATISTICS_FILE: &str = "basic_statistics.csv";
pub const STANDARD_COMPARISON_FILE: &str = "standard_comparison.csv";
pub const POWER_QUALITY_FILE: &str = "power_quality_indices.csv";
pub const CIRCUIT_METRICS_FILE: &str = "circuit_metrics.csv";
pub const FAULT_SUMMARY_FILE: &str = "fault_summary.csv";
pub const LOAD_DAILY_FILE: &str = "load_pattern_daily.csv";
pub const LOAD_WEEKLY_FILE: &str = "load_pattern_weekly.csv";
pub const LOAD_HOURLY_FILE: &str = "load_pattern_hourly_profile.csv";

/// All derived tables for one measurement table and one set of standards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub standards: GridStandards,
    pub station_count: usize,
    pub sample_count: usize,
    pub statistics: Vec<StationStatistics>,
    pub load_patterns: LoadPatterns,
    pub compliance: Vec<StationCompliance>,
    pub quality: Vec<PowerQualityIndex>,
    pub circuit: Vec<CircuitMetrics>,
    pub faults: Vec<FaultSummary>,
}

impl AnalysisReport {
    pub fn compute(table: &MeasurementTable, standards: &GridStandards) -> Self {
        let report = Self {
            standards: *standards,
            station_count: table.station_ids().len(),
            sample_count: table.len(),
            statistics: calculate_basic_statistics(table),
            load_patterns: identify_load_patterns(table),
            compliance: compare_to_standards(table, standards),
            quality: calculate_power_quality_indices(table, standards),
            circuit: calculate_circuit_metrics(table, standards),
            faults: perform_fault_analysis(table, standards),
        };
        info!(
            stations = report.station_count,
            samples = report.sample_count,
            "analysis complete"
        );
        report
    }

    /// Write one CSV per table into `dir`, creating it when needed.
    /// Returns the written paths in a fixed order.
    pub fn export_csv(&self, dir: &Path) -> AnalyticsResult<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;

        let written = vec![
            write_table(&dir.join(BASIC_STATISTICS_FILE), &self.statistics)?,
            write_table(&dir.join(STANDARD_COMPARISON_FILE), &self.compliance)?,
            write_table(&dir.join(POWER_QUALITY_FILE), &self.quality)?,
            write_table(&dir.join(CIRCUIT_METRICS_FILE), &self.circuit)?,
            write_table(&dir.join(FAULT_SUMMARY_FILE), &self.faults)?,
            write_table(&dir.join(LOAD_DAILY_FILE), &self.load_patterns.daily)?,
            write_table(&dir.join(LOAD_WEEKLY_FILE), &self.load_patterns.weekly)?,
            write_table(&dir.join(LOAD_HOURLY_FILE), &self.load_patterns.hourly_profile)?,
        ];
        info!(dir = %dir.display(), files = written.len(), "exported csv reports");
        Ok(written)
    }

    pub fn export_json(&self, path: &Path) -> AnalyticsResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "exported json report");
        Ok(())
    }

    /// One line per station and table, grouped by table
    pub fn summary_lines(&self) -> Vec<String> {
        self.statistics
            .iter()
            .map(ToString::to_string)
            .chain(self.compliance.iter().map(ToString::to_string))
            .chain(self.quality.iter().map(ToString::to_string))
            .chain(self.faults.iter().map(ToString::to_string))
            .collect()
    }
}

fn write_table<T: Serialize + Default>(path: &Path, rows: &[T]) -> AnalyticsResult<PathBuf> {
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(&column_names::<T>()?)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote table");
    Ok(path.to_path_buf())
}

/// Header row the csv serializer derives from `T`'s field names
fn column_names<T: Serialize + Default>() -> AnalyticsResult<csv::StringRecord> {
    let mut scratch = csv::Writer::from_writer(Vec::new());
    scratch.serialize(T::default())?;
    let bytes = scratch.into_inner().map_err(|err| err.into_error())?;
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    Ok(reader.headers()?.clone())
}
