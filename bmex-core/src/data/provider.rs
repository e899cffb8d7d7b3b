//! Capability traits for the remote side and structured error types.
//!
//! `ArchiveSource` and `SymbolCatalog` abstract over the BitMEX endpoints so the
//! pipeline can run against deterministic fakes in tests.

use chrono::NaiveDate;
use reqwest::StatusCode;
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::Channel;

/// Structured error types for harvesting operations.
///
/// These are designed to be displayable directly in CLI output.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    #[error("no symbols requested")]
    EmptySymbolSet,

    #[error("not valid symbol(s): {}", symbols.join(", "))]
    InvalidSymbols { symbols: Vec<String> },

    #[error("unknown channel '{0}' (expected trades or quotes)")]
    UnknownChannel(String),

    #[error("instrument catalog unavailable: {0}")]
    Catalog(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} fetching {channel} archive for {date}")]
    Http {
        channel: Channel,
        date: NaiveDate,
        status: StatusCode,
    },

    #[error("corrupt archive for {date}: {source}")]
    Decompression {
        date: NaiveDate,
        #[source]
        source: io::Error,
    },

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DataError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DataError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Transport-level failure of a single request (no HTTP status was received).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Connection and timeout failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout(_))
    }
}

/// Status and body of one archive request.
#[derive(Debug, Clone)]
pub struct ArchiveResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ArchiveResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// One channel's compressed archive for one day.
#[derive(Debug, Clone)]
pub struct DailyArchive {
    pub channel: Channel,
    pub date: NaiveDate,
    pub bytes: Vec<u8>,
}

/// Terminal, non-fatal result of fetching a day.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched(DailyArchive),
    /// Today's or yesterday's archive has not been published yet.
    NotYetPublished { date: NaiveDate, status: StatusCode },
}

/// Source of daily archives.
///
/// Implementations perform exactly one request per call; retrying is the
/// fetcher's job.
pub trait ArchiveSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Request the archive for `channel` on `date`.
    fn get(&self, channel: Channel, date: NaiveDate) -> Result<ArchiveResponse, TransportError>;
}

/// Reference list of tradeable and historical instruments.
pub trait SymbolCatalog: Send + Sync {
    fn list_valid_symbols(&self) -> Result<HashSet<String>, DataError>;
}

/// Observer for retry attempts while fetching an archive.
pub trait FetchProgress {
    /// Called after a failed attempt when another one will follow.
    fn on_retry(&self, channel: Channel, date: NaiveDate, attempt: u32, max_attempts: u32, reason: &str);
}

/// Observer that ignores everything.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_retry(&self, _: Channel, _: NaiveDate, _: u32, _: u32, _: &str) {}
}
