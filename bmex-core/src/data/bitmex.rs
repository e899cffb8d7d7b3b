//! BitMEX HTTP client.
//!
//! Serves both remote capabilities: daily archives from the public S3 bucket
//! and the instrument catalog from the REST API. One request per call; the
//! fetcher owns retrying.
//!
//! The catalog endpoint caps page size at 500, so it is paged until a short
//! page comes back, up to 40 pages.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

use super::catalog::parse_instrument_page;
use super::provider::{ArchiveResponse, ArchiveSource, DataError, SymbolCatalog, TransportError};
use crate::domain::Channel;

/// Public bucket holding `data/{trade,quote}/{YYYYMMDD}.csv.gz`.
pub const DEFAULT_ARCHIVE_BASE: &str = "https://s3-eu-west-1.amazonaws.com/public.bitmex.com";

/// REST endpoint listing every instrument, active or expired.
pub const DEFAULT_CATALOG_URL: &str = "https://www.bitmex.com/api/v1/instrument";

const CATALOG_PAGE_SIZE: usize = 500;
const MAX_CATALOG_PAGES: usize = 40;

/// Blocking BitMEX client.
pub struct BitmexClient {
    client: reqwest::blocking::Client,
    archive_base: String,
    catalog_url: String,
}

impl BitmexClient {
    pub fn new(
        archive_base: impl Into<String>,
        catalog_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bmex/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            archive_base: archive_base.into().trim_end_matches('/').to_string(),
            catalog_url: catalog_url.into(),
        })
    }

    /// Client for the production endpoints.
    pub fn production(timeout: Duration) -> Result<Self, DataError> {
        Self::new(DEFAULT_ARCHIVE_BASE, DEFAULT_CATALOG_URL, timeout)
    }

    /// `{base}/data/{channel}/{YYYYMMDD}.csv.gz`
    pub fn archive_url(base: &str, channel: Channel, date: NaiveDate) -> String {
        format!(
            "{}/data/{}/{}.csv.gz",
            base.trim_end_matches('/'),
            channel.remote_name(),
            date.format("%Y%m%d")
        )
    }

    fn catalog_page(&self, start: usize) -> Result<Vec<String>, DataError> {
        let resp = self
            .client
            .get(&self.catalog_url)
            .query(&[
                ("count", CATALOG_PAGE_SIZE.to_string()),
                ("start", start.to_string()),
                ("reverse", "false".to_string()),
            ])
            .send()
            .map_err(|e| DataError::Catalog(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::Catalog(format!("HTTP {status}")));
        }

        let body = resp
            .bytes()
            .map_err(|e| DataError::Catalog(format!("failed to read response: {e}")))?;
        parse_instrument_page(&body)
    }
}

fn transport_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() || e.is_body() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

impl ArchiveSource for BitmexClient {
    fn name(&self) -> &str {
        "bitmex_public_archive"
    }

    fn get(&self, channel: Channel, date: NaiveDate) -> Result<ArchiveResponse, TransportError> {
        let url = Self::archive_url(&self.archive_base, channel, date);
        debug!(%url, "GET");

        let resp = self.client.get(&url).send().map_err(transport_error)?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Ok(ArchiveResponse::status(status));
        }

        let body = resp.bytes().map_err(transport_error)?;
        Ok(ArchiveResponse {
            status,
            body: body.to_vec(),
        })
    }
}

impl SymbolCatalog for BitmexClient {
    fn list_valid_symbols(&self) -> Result<HashSet<String>, DataError> {
        collect_catalog(|start| self.catalog_page(start))
    }
}

/// Page through the catalog until a short page. Running out of pages while
/// they are still full is a `Catalog` error, never a partial set.
fn collect_catalog(
    mut fetch_page: impl FnMut(usize) -> Result<Vec<String>, DataError>,
) -> Result<HashSet<String>, DataError> {
    let mut symbols = HashSet::new();

    for page in 0..MAX_CATALOG_PAGES {
        let batch = fetch_page(page * CATALOG_PAGE_SIZE)?;
        let full_page = batch.len() >= CATALOG_PAGE_SIZE;
        debug!(page, entries = batch.len(), "instrument page");
        symbols.extend(batch);
        if !full_page {
            return Ok(symbols);
        }
    }

    Err(DataError::Catalog(format!(
        "instrument list exceeds {} entries ({MAX_CATALOG_PAGES} pages of {CATALOG_PAGE_SIZE})",
        MAX_CATALOG_PAGES * CATALOG_PAGE_SIZE
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_url_format() {
        let date = NaiveDate::from_ymd_opt(2018, 10, 30).unwrap();
        assert_eq!(
            BitmexClient::archive_url(DEFAULT_ARCHIVE_BASE, Channel::Trade, date),
            "https://s3-eu-west-1.amazonaws.com/public.bitmex.com/data/trade/20181030.csv.gz"
        );
        assert_eq!(
            BitmexClient::archive_url("http://localhost:9000/", Channel::Quote, date),
            "http://localhost:9000/data/quote/20181030.csv.gz"
        );
    }

    fn page(start: usize, len: usize) -> Vec<String> {
        (start..start + len).map(|i| format!("SYM{i}")).collect()
    }

    #[test]
    fn catalog_pages_until_short_page() {
        let mut starts = Vec::new();
        let symbols = collect_catalog(|start| {
            starts.push(start);
            let len = if start == 0 { CATALOG_PAGE_SIZE } else { 3 };
            Ok(page(start, len))
        })
        .unwrap();
        assert_eq!(starts, vec![0, CATALOG_PAGE_SIZE]);
        assert_eq!(symbols.len(), CATALOG_PAGE_SIZE + 3);
        assert!(symbols.contains("SYM502"));
    }

    #[test]
    fn catalog_exactly_filling_a_page_reads_one_more() {
        let symbols = collect_catalog(|start| {
            Ok(if start == 0 { page(0, CATALOG_PAGE_SIZE) } else { Vec::new() })
        })
        .unwrap();
        assert_eq!(symbols.len(), CATALOG_PAGE_SIZE);
    }

    #[test]
    fn catalog_still_full_after_last_page_is_an_error() {
        let mut calls = 0;
        let err = collect_catalog(|start| {
            calls += 1;
            Ok(page(start, CATALOG_PAGE_SIZE))
        })
        .unwrap_err();
        assert_eq!(calls, MAX_CATALOG_PAGES);
        assert!(matches!(err, DataError::Catalog(msg) if msg.contains("exceeds 20000 entries")));
    }

    #[test]
    fn catalog_page_error_propagates() {
        let err = collect_catalog(|_| Err(DataError::Catalog("HTTP 503".into()))).unwrap_err();
        assert!(matches!(err, DataError::Catalog(msg) if msg == "HTTP 503"));
    }

    #[test]
    fn client_builds() {
        assert!(BitmexClient::production(Duration::from_secs(5)).is_ok());
    }
}
