//! Remote capabilities, archive retrieval and partitioned persistence

pub mod bitmex;
pub mod catalog;
pub mod decompress;
pub mod fetch;
pub mod provider;
pub mod retry;
pub mod router;
pub mod sink;

pub use bitmex::{BitmexClient, DEFAULT_ARCHIVE_BASE, DEFAULT_CATALOG_URL};
pub use catalog::{parse_instrument_page, validate_symbols};
pub use decompress::{decompress, Spool};
pub use fetch::fetch_archive;
pub use provider::{
    ArchiveResponse, ArchiveSource, DailyArchive, DataError, FetchOutcome, FetchProgress,
    SilentProgress, SymbolCatalog, TransportError,
};
pub use retry::{retry, Attempt, RetryPolicy};
pub use router::{route_day, RouteStats};
pub use sink::{FsPartitionSink, MemorySink, PartitionSink};

pub use reqwest::StatusCode;
