//! Destination layout for routed records.
//!
//! Layout: `{root}/BITMEX/{symbol}/{channel}s/{year}/{month}/{YYYY-MM-DD}.csv`
//!
//! The month directory is not zero-padded; the file name is.

use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};

use super::Channel;

/// Name of the exchange directory directly under the output root.
pub const EXCHANGE_DIR: &str = "BITMEX";

/// Identifies one destination file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    pub symbol: String,
    pub channel: Channel,
    pub date: NaiveDate,
}

impl PartitionKey {
    pub fn new(symbol: impl Into<String>, channel: Channel, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            channel,
            date,
        }
    }

    /// Directory relative to the output root.
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(EXCHANGE_DIR)
            .join(&self.symbol)
            .join(self.channel.plural())
            .join(self.date.year().to_string())
            .join(self.date.month().to_string())
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.date.format("%Y-%m-%d"))
    }

    /// Full path of the destination file under `root`.
    pub fn path_under(&self, root: &Path) -> PathBuf {
        root.join(self.relative_dir()).join(self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_archive_tree() {
        let key = PartitionKey::new(
            "XBTUSD",
            Channel::Trade,
            NaiveDate::from_ymd_opt(2018, 3, 7).unwrap(),
        );
        assert_eq!(
            key.path_under(Path::new("/data")),
            PathBuf::from("/data/BITMEX/XBTUSD/trades/2018/3/2018-03-07.csv")
        );
    }

    #[test]
    fn quotes_use_plural_directory() {
        let key = PartitionKey::new(
            "ETHUSD",
            Channel::Quote,
            NaiveDate::from_ymd_opt(2018, 11, 1).unwrap(),
        );
        assert_eq!(
            key.relative_dir(),
            PathBuf::from("BITMEX/ETHUSD/quotes/2018/11")
        );
        assert_eq!(key.file_name(), "2018-11-01.csv");
    }
}
