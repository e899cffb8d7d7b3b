use csv::StringRecord;

use crate::data::provider::DataError;

/// Separator BitMEX archives place between the date and time of a timestamp.
const ARCHIVE_TIME_SEPARATOR: char = 'D';

/// One row of a trade or quote archive.
///
/// Only the first two columns are interpreted; the rest are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: String,
    pub symbol: String,
    pub fields: Vec<String>,
}

impl Record {
    /// Build a record from a raw archive row, normalizing its timestamp.
    ///
    /// `line` is only used for error reporting.
    pub fn from_row(row: &StringRecord, line: u64) -> Result<Self, DataError> {
        let mut cols = row.iter();
        let (timestamp, symbol) = match (cols.next(), cols.next()) {
            (Some(ts), Some(sym)) => (ts, sym),
            _ => {
                return Err(DataError::MalformedRecord {
                    line,
                    reason: format!("expected at least 2 columns, found {}", row.len()),
                })
            }
        };

        Ok(Self {
            timestamp: normalize_timestamp(timestamp),
            symbol: symbol.to_string(),
            fields: cols.map(str::to_string).collect(),
        })
    }

    /// Columns in output order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        [self.timestamp.as_str(), self.symbol.as_str()]
            .into_iter()
            .chain(self.fields.iter().map(|f| f.as_str()))
    }
}

/// Rewrite `2018-10-30D12:00:00.123` as `2018-10-30 12:00:00.123`.
///
/// Only the first separator is replaced; values without one pass through unchanged.
pub fn normalize_timestamp(raw: &str) -> String {
    raw.replacen(ARCHIVE_TIME_SEPARATOR, " ", 1)
}
