//! Measurement ingestion
//!
//! Reads delimited measurement files into a [`MeasurementTable`]. Only the
//! structure is checked here: required headers, parseable timestamps and
//! numeric cells. Out-of-range values pass through untouched.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::domain::{Measurement, MeasurementTable};
use crate::error::{AnalyticsError, AnalyticsResult};

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const STATION_COLUMN: &str = "station_id";

/// Every header a measurement file must carry
pub const REQUIRED_COLUMNS: [&str; 7] = [
    TIMESTAMP_COLUMN,
    STATION_COLUMN,
    "voltage_pu",
    "current_pu",
    "real_power_mw",
    "reactive_power_mvar",
    "power_factor",
];

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const MISSING_SPELLINGS: [&str; 4] = ["nan", "na", "n/a", "null"];

/// Load a measurement CSV file and sort it by timestamp
pub fn load_power_data(path: &Path) -> AnalyticsResult<MeasurementTable> {
    let file = File::open(path)?;
    let table = read_measurements(file)?;
    info!(
        path = %path.display(),
        rows = table.len(),
        stations = table.station_ids().len(),
        "loaded measurement table"
    );
    Ok(table)
}

/// Parse measurements from any CSV source with a header row
pub fn read_measurements<R: Read>(reader: R) -> AnalyticsResult<MeasurementTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let layout = ColumnLayout::from_headers(rdr.headers()?)?;

    let mut rows = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(index as u64 + 2);
        rows.push(layout.parse_record(&record, line)?);
    }

    let unassigned = rows.iter().filter(|m| !m.has_station()).count();
    if unassigned > 0 {
        warn!(rows = unassigned, "measurement rows without a station id are excluded from analysis");
    }
    let incomplete = rows.iter().filter(|m| m.has_missing_values()).count();
    if incomplete > 0 {
        warn!(rows = incomplete, "measurement rows contain missing values");
    }
    debug!(rows = rows.len(), "parsed measurement records");

    Ok(MeasurementTable::new(rows))
}

/// Parse a timestamp cell.
///
/// Accepts RFC 3339 (converted to UTC and made naive), ISO-like date-times
/// with a space or `T` separator and optional fractional seconds, minute
/// resolution date-times, and bare dates at midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parse a numeric cell; empty cells and NaN spellings become `f64::NAN`
fn parse_number(value: &str) -> Option<f64> {
    if value.is_empty()
        || MISSING_SPELLINGS
            .iter()
            .any(|spelling| value.eq_ignore_ascii_case(spelling))
    {
        return Some(f64::NAN);
    }
    value.parse::<f64>().ok()
}

/// Station id cell; blank cells and NaN spellings mean no station
fn parse_station(value: &str) -> &str {
    if MISSING_SPELLINGS
        .iter()
        .any(|spelling| value.eq_ignore_ascii_case(spelling))
    {
        ""
    } else {
        value
    }
}

/// Positions of the required columns within a header row
struct ColumnLayout {
    indices: [usize; REQUIRED_COLUMNS.len()],
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> AnalyticsResult<Self> {
        let mut indices = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, column) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|header| header == column)
                .ok_or_else(|| AnalyticsError::MissingColumn {
                    column: column.to_string(),
                })?;
        }
        Ok(Self { indices })
    }

    fn cell<'r>(&self, record: &'r StringRecord, slot: usize) -> &'r str {
        record.get(self.indices[slot]).unwrap_or("")
    }

    fn number(&self, record: &StringRecord, slot: usize, line: u64) -> AnalyticsResult<f64> {
        let raw = self.cell(record, slot);
        parse_number(raw).ok_or_else(|| AnalyticsError::InvalidNumber {
            line,
            column: REQUIRED_COLUMNS[slot].to_string(),
            value: raw.to_string(),
        })
    }

    fn parse_record(&self, record: &StringRecord, line: u64) -> AnalyticsResult<Measurement> {
        let raw_timestamp = self.cell(record, 0);
        let timestamp =
            parse_timestamp(raw_timestamp).ok_or_else(|| AnalyticsError::UnparseableTimestamp {
                line,
                value: raw_timestamp.to_string(),
            })?;

        Ok(Measurement {
            timestamp,
            station_id: parse_station(self.cell(record, 1)).to_string(),
            voltage_pu: self.number(record, 2, line)?,
            current_pu: self.number(record, 3, line)?,
            real_power_mw: self.number(record, 4, line)?,
            reactive_power_mvar: self.number(record, 5, line)?,
            power_factor: self.number(record, 6, line)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const HEADER: &str =
        "timestamp,station_id,voltage_pu,current_pu,real_power_mw,reactive_power_mvar,power_factor";

    #[test]
    fn test_reads_and_sorts_rows() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-01 02:00:00,SUB_001,1.01,80.0,79.0,30.0,0.93\n\
             2024-01-01 00:00:00,SUB_002,0.99,60.0,58.0,20.0,0.94\n\
             2024-01-01 01:00:00,SUB_001,1.00,81.0,80.0,31.0,0.92\n"
        );
        let table = read_measurements(csv.as_bytes()).unwrap();

        assert_eq!(table.len(), 3);
        let hours: Vec<u32> = table.iter().map(|m| m.timestamp.hour()).collect();
        assert_eq!(hours, vec![0, 1, 2]);
        assert_eq!(table.rows()[0].station_id, "SUB_002");
        assert_eq!(table.rows()[2].power_factor, 0.93);
    }

    #[test]
    fn test_column_order_is_free() {
        let csv = "station_id,power_factor,timestamp,voltage_pu,current_pu,reactive_power_mvar,real_power_mw,extra\n\
                   SUB_001,0.95,2024-03-15T10:00:00,1.0,50.0,10.0,40.0,ignored\n";
        let table = read_measurements(csv.as_bytes()).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.real_power_mw, 40.0);
        assert_eq!(row.reactive_power_mvar, 10.0);
        assert_eq!(row.timestamp.hour(), 10);
    }

    #[test]
    fn test_missing_column_is_malformed_input() {
        let csv = "timestamp,station_id,voltage_pu,current_pu,real_power_mw,power_factor\n";
        let err = read_measurements(csv.as_bytes()).unwrap_err();
        assert!(err.is_malformed_input());
        assert!(matches!(
            err,
            AnalyticsError::MissingColumn { ref column } if column == "reactive_power_mvar"
        ));
    }

    #[test]
    fn test_unparseable_timestamp_reports_line() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-01 00:00:00,SUB_001,1.0,50.0,40.0,10.0,0.95\n\
             yesterday,SUB_001,1.0,50.0,40.0,10.0,0.95\n"
        );
        let err = read_measurements(csv.as_bytes()).unwrap_err();
        assert!(err.is_malformed_input());
        match err {
            AnalyticsError::UnparseableTimestamp { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_numbers_become_nan() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-01 00:00:00,SUB_001,,50.0,NaN,10.0,0.95\n"
        );
        let table = read_measurements(csv.as_bytes()).unwrap();
        let row = &table.rows()[0];
        assert!(row.voltage_pu.is_nan());
        assert!(row.real_power_mw.is_nan());
        assert_eq!(row.current_pu, 50.0);
    }

    #[test]
    fn test_invalid_number_names_column() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-01 00:00:00,SUB_001,1.0,high,40.0,10.0,0.95\n"
        );
        let err = read_measurements(csv.as_bytes()).unwrap_err();
        match err {
            AnalyticsError::InvalidNumber { column, value, .. } => {
                assert_eq!(column, "current_pu");
                assert_eq!(value, "high");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-15 06:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-15T06:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-15 06:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-15T07:30:00+01:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-15"),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(0, 0, 0)
        );
        assert!(parse_timestamp("15/03/2024").is_none());
    }

    #[test]
    fn test_short_row_fills_missing_cells_with_nan() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-01 00:00:00,SUB_001,1.0,50.0,40.0,10.0,0.95\n\
             2024-01-01 01:00:00,SUB_001,1.0,50.0,40.0\n"
        );
        let table = read_measurements(csv.as_bytes()).unwrap();
        let row = &table.rows()[1];
        assert_eq!(row.real_power_mw, 40.0);
        assert!(row.reactive_power_mvar.is_nan());
        assert!(row.power_factor.is_nan());
    }

    #[test]
    fn test_short_row_without_timestamp_is_malformed() {
        let csv = format!("{HEADER}\n,SUB_001\n");
        let err = read_measurements(csv.as_bytes()).unwrap_err();
        assert!(err.is_malformed_input());
        assert!(matches!(err, AnalyticsError::UnparseableTimestamp { line: 2, .. }));
    }

    #[test]
    fn test_blank_station_id_is_unassigned() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-01 00:00:00,,1.0,50.0,40.0,10.0,0.95\n\
             2024-01-01 01:00:00,NaN,1.0,50.0,40.0,10.0,0.95\n\
             2024-01-01 02:00:00,SUB_001,1.0,50.0,40.0,10.0,0.95\n"
        );
        let table = read_measurements(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert!(!table.rows()[0].has_station());
        assert!(!table.rows()[1].has_station());
        assert_eq!(table.station_ids().into_iter().collect::<Vec<_>>(), vec!["SUB_001"]);
    }

    #[test]
    fn test_header_only_file_is_empty_table() {
        let table = read_measurements(format!("{HEADER}\n").as_bytes()).unwrap();
        assert!(table.is_empty());
    }
}
