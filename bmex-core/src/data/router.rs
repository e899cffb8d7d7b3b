//! Record router: filter one day's rows by symbol and fan them out to partitions.
//!
//! The first time a partition is touched while routing a day it is reset, so
//! re-running a day replaces its files instead of appending duplicates.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use tracing::debug;

use super::provider::DataError;
use super::sink::PartitionSink;
use crate::domain::{Channel, PartitionKey, Record, SymbolSet};

/// Counters for one routed day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteStats {
    /// Rows read from the archive, including the header and dropped rows.
    pub rows_read: u64,
    /// Rows written to a partition.
    pub rows_kept: u64,
    /// Rows written per symbol.
    pub per_symbol: BTreeMap<String, u64>,
}

/// Route every row of `reader` for `channel` on `date` into `sink`.
///
/// Rows are partitioned by the archive's day, not re-derived from each
/// timestamp. The sink is finished before returning successfully.
pub fn route_day<R: Read>(
    reader: R,
    channel: Channel,
    date: NaiveDate,
    symbols: &SymbolSet,
    sink: &mut dyn PartitionSink,
) -> Result<RouteStats, DataError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut stats = RouteStats::default();
    let mut touched: HashSet<PartitionKey> = HashSet::new();
    let mut row = csv::StringRecord::new();

    while csv_reader.read_record(&mut row)? {
        stats.rows_read += 1;
        let line = row.position().map_or(stats.rows_read, |p| p.line());
        let record = Record::from_row(&row, line)?;

        if !symbols.contains(&record.symbol) {
            continue;
        }

        let key = PartitionKey::new(record.symbol.as_str(), channel, date);
        if touched.insert(key.clone()) {
            sink.reset(&key)?;
        }
        sink.append(&key, &record)?;

        stats.rows_kept += 1;
        *stats.per_symbol.entry(record.symbol).or_default() += 1;
    }

    sink.finish()?;
    debug!(
        %channel,
        %date,
        rows_read = stats.rows_read,
        rows_kept = stats.rows_kept,
        partitions = touched.len(),
        "day routed"
    );
    Ok(stats)
}
