use std::collections::BTreeMap;

use crate::domain::{Measurement, MeasurementTable};

/// Station identifier to that station's rows, keys ascending, rows in table order
pub(crate) type StationGroups<'a> = BTreeMap<&'a str, Vec<&'a Measurement>>;

/// Partition a table by exact `station_id`.
///
/// Rows are neither deduplicated nor reordered within a partition. Every
/// partition holds at least one row. Rows without a station id belong to
/// no partition.
pub(crate) fn group_by_station(table: &MeasurementTable) -> StationGroups<'_> {
    let mut groups: StationGroups<'_> = BTreeMap::new();
    for measurement in table.iter().filter(|m| m.has_station()) {
        groups
            .entry(measurement.station_id.as_str())
            .or_default()
            .push(measurement);
    }
    groups
}
