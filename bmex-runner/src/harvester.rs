//! Run orchestrator: validate once, then fetch, decompress and route each day.
//!
//! Channels run one after another (trades before quotes). Within a channel,
//! days are processed oldest first. A day whose archive is not published yet
//! ends that channel softly; every other failure aborts the whole run. Files
//! written for days that completed before an abort are left in place.

use chrono::{NaiveDate, Utc};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use bmex_core::data::{
    decompress, fetch_archive, route_day, validate_symbols, ArchiveSource, DataError,
    FetchOutcome, FsPartitionSink, PartitionSink, SymbolCatalog,
};
use bmex_core::domain::{Channel, DateWindow, SymbolSet};

use crate::config::{ConfigError, HarvestConfig};
use crate::progress::HarvestProgress;
use crate::report::{ChannelStatus, RunReport};

/// Errors that stop a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("no channels requested")]
    NoChannels,
}

/// What to harvest: an inclusive date range, symbols and channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub symbols: SymbolSet,
    pub channels: Vec<Channel>,
}

impl HarvestRequest {
    pub fn new(start: NaiveDate, end: NaiveDate, symbols: SymbolSet, channels: Vec<Channel>) -> Self {
        Self {
            start,
            end,
            symbols,
            channels,
        }
    }

    /// Requested channels, deduplicated, trades first.
    pub fn ordered_channels(&self) -> Vec<Channel> {
        self.channels
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Where a run is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidatingInputs,
    FetchingDay,
    DecompressingDay,
    RoutingDay,
    AdvancingDay,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ValidatingInputs => "validating inputs",
            Stage::FetchingDay => "fetching",
            Stage::DecompressingDay => "decompressing",
            Stage::RoutingDay => "routing",
            Stage::AdvancingDay => "advancing",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Drives one or more harvest runs against injected remote capabilities.
pub struct Harvester<'a, P: HarvestProgress> {
    source: &'a dyn ArchiveSource,
    catalog: &'a dyn SymbolCatalog,
    progress: &'a P,
    config: HarvestConfig,
    today: NaiveDate,
}

impl<'a, P: HarvestProgress> Harvester<'a, P> {
    /// "Today" defaults to the current UTC date.
    pub fn new(
        source: &'a dyn ArchiveSource,
        catalog: &'a dyn SymbolCatalog,
        progress: &'a P,
        config: HarvestConfig,
    ) -> Self {
        Self {
            source,
            catalog,
            progress,
            config,
            today: Utc::now().date_naive(),
        }
    }

    /// Pin the date used for end-date clamping and the recent-404 rule.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Harvest into the on-disk tree under `config.output_root`.
    pub fn run(&self, request: &HarvestRequest) -> Result<RunReport, HarvestError> {
        let mut sink = FsPartitionSink::new(&self.config.output_root);
        self.run_into(request, &mut sink)
    }

    /// Harvest into an arbitrary sink.
    pub fn run_into(
        &self,
        request: &HarvestRequest,
        sink: &mut dyn PartitionSink,
    ) -> Result<RunReport, HarvestError> {
        let window = self.validate(request)?;
        let channels = request.ordered_channels();
        info!(
            start = %window.start(),
            end = %window.end(),
            days = window.len_days(),
            symbols = request.symbols.len(),
            "harvest started"
        );

        let symbols = request.symbols.iter().map(str::to_string).collect();
        let mut report = RunReport::new(window, symbols);

        for channel in channels {
            self.progress.on_channel_start(channel, &window);
            let status = self.run_channel(channel, &window, &request.symbols, sink)?;
            self.progress.on_channel_complete(channel, &status);
            report.channels.insert(channel, status);
        }

        info!(stage = %Stage::Done, rows = report.total_rows(), "harvest finished");
        self.progress.on_run_complete(&report);
        Ok(report)
    }

    fn validate(&self, request: &HarvestRequest) -> Result<DateWindow, HarvestError> {
        let stage = Stage::ValidatingInputs;
        debug!(%stage, today = %self.today);

        self.config.validate()?;
        if request.channels.is_empty() {
            return Err(HarvestError::NoChannels);
        }
        let window = DateWindow::validate(request.start, request.end, self.today)
            .map_err(|e| aborted(stage, e))?;
        if window.end() < request.end {
            info!(requested = %request.end, end = %window.end(), "end date lowered to today");
        }
        validate_symbols(self.catalog, &request.symbols).map_err(|e| aborted(stage, e))?;
        Ok(window)
    }

    fn run_channel(
        &self,
        channel: Channel,
        window: &DateWindow,
        symbols: &SymbolSet,
        sink: &mut dyn PartitionSink,
    ) -> Result<ChannelStatus, DataError> {
        let policy = self.config.retry_policy();
        let scratch = self.config.scratch_dir.as_deref();
        let mut days = 0u32;
        let mut rows = 0u64;

        for date in window.days() {
            let outcome = fetch_archive(self.source, channel, date, policy, self.today, self.progress)
                .map_err(|e| aborted_day(Stage::FetchingDay, channel, date, e))?;
            let archive = match outcome {
                FetchOutcome::Fetched(archive) => archive,
                FetchOutcome::NotYetPublished { date, status } => {
                    warn!(%channel, %date, %status, "archive not published yet, stopping channel");
                    return Ok(ChannelStatus::Unavailable {
                        date,
                        http_status: status.as_u16(),
                        days,
                        rows,
                    });
                }
            };

            let spool = decompress(&archive, scratch)
                .map_err(|e| aborted_day(Stage::DecompressingDay, channel, date, e))?;
            drop(archive);
            debug!(%channel, %date, bytes = spool.len(), "archive expanded");

            let stats = spool
                .reader()
                .and_then(|reader| route_day(reader, channel, date, symbols, &mut *sink))
                .map_err(|e| aborted_day(Stage::RoutingDay, channel, date, e))?;

            debug!(stage = %Stage::AdvancingDay, %channel, %date);
            days += 1;
            rows += stats.rows_kept;
            info!(%channel, %date, rows = stats.rows_kept, "day processed");
            self.progress.on_day_complete(channel, date, &stats);
        }

        Ok(ChannelStatus::Completed { days, rows })
    }
}

fn aborted(stage: Stage, e: DataError) -> DataError {
    error!(%stage, next = %Stage::Aborted, "{e}");
    e
}

fn aborted_day(stage: Stage, channel: Channel, date: NaiveDate, e: DataError) -> DataError {
    error!(%stage, next = %Stage::Aborted, %channel, %date, "{e}");
    e
}
