//! Archive fetcher: retrying GET of one (channel, day) archive.
//!
//! Every non-200 response is retried. Once attempts are exhausted, a 404 for
//! today or yesterday means the archive simply has not been published yet and
//! is reported as [`FetchOutcome::NotYetPublished`]; anything else is fatal.

use chrono::NaiveDate;
use reqwest::StatusCode;
use std::fmt;
use tracing::{debug, warn};

use super::provider::{
    ArchiveSource, DailyArchive, DataError, FetchOutcome, FetchProgress, TransportError,
};
use super::retry::{retry, Attempt, RetryPolicy};
use crate::domain::{is_recent, Channel};

/// Why a single attempt failed.
#[derive(Debug)]
enum FetchFailure {
    Status(StatusCode),
    Transport(TransportError),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(status) => write!(f, "{}", status.as_u16()),
            FetchFailure::Transport(e) => write!(f, "{e}"),
        }
    }
}

/// Fetch the archive for `channel` on `date`, retrying per `policy`.
///
/// `today` decides whether a persistent 404 is expected (recent day) or fatal.
pub fn fetch_archive(
    source: &dyn ArchiveSource,
    channel: Channel,
    date: NaiveDate,
    policy: RetryPolicy,
    today: NaiveDate,
    progress: &dyn FetchProgress,
) -> Result<FetchOutcome, DataError> {
    let result = retry(
        policy,
        |attempt| {
            debug!(source = source.name(), %channel, %date, attempt, "requesting archive");
            match source.get(channel, date) {
                Ok(resp) if resp.status == StatusCode::OK => Attempt::Done(resp.body),
                Ok(resp) => Attempt::Retry(FetchFailure::Status(resp.status)),
                Err(e) if e.is_retryable() => Attempt::Retry(FetchFailure::Transport(e)),
                Err(e) => Attempt::Abort(FetchFailure::Transport(e)),
            }
        },
        |attempt, failure| {
            warn!(%channel, %date, attempt, "{failure} error processing {date}, retrying");
            progress.on_retry(channel, date, attempt, policy.max_attempts, &failure.to_string());
        },
    );

    match result {
        Ok(bytes) => {
            debug!(%channel, %date, bytes = bytes.len(), "archive downloaded");
            Ok(FetchOutcome::Fetched(DailyArchive {
                channel,
                date,
                bytes,
            }))
        }
        Err(FetchFailure::Status(status))
            if status == StatusCode::NOT_FOUND && is_recent(date, today) =>
        {
            warn!(%channel, %date, "archive not published yet");
            Ok(FetchOutcome::NotYetPublished { date, status })
        }
        Err(FetchFailure::Status(status)) => Err(DataError::Http {
            channel,
            date,
            status,
        }),
        Err(FetchFailure::Transport(e)) => Err(DataError::NetworkUnreachable(format!(
            "{channel} archive for {date}: {e}"
        ))),
    }
}
