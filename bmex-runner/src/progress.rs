//! Progress callbacks for a harvest run.
//!
//! The harvester never prints; it reports to a [`HarvestProgress`]. The CLI
//! plugs in [`StdoutProgress`], tests use [`NullProgress`] or a recorder.

use chrono::NaiveDate;
use std::io::{self, Write};
use std::sync::Mutex;

use bmex_core::data::{FetchProgress, RouteStats};
use bmex_core::domain::{Channel, DateWindow};

use crate::report::{ChannelStatus, RunReport};

const RULE_WIDTH: usize = 80;

/// Observer for a run. Retry notices come through [`FetchProgress::on_retry`].
pub trait HarvestProgress: FetchProgress {
    fn on_channel_start(&self, _channel: Channel, _window: &DateWindow) {}

    fn on_day_complete(&self, _channel: Channel, _date: NaiveDate, _stats: &RouteStats) {}

    fn on_channel_complete(&self, _channel: Channel, _status: &ChannelStatus) {}

    fn on_run_complete(&self, _report: &RunReport) {}
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl FetchProgress for NullProgress {
    fn on_retry(&self, _: Channel, _: NaiveDate, _: u32, _: u32, _: &str) {}
}

impl HarvestProgress for NullProgress {}

/// Line-oriented progress text written to any `Write`.
pub struct TextProgress<W: Write> {
    out: Mutex<W>,
}

/// [`TextProgress`] on standard output.
pub type StdoutProgress = TextProgress<io::Stdout>;

impl StdoutProgress {
    pub fn stdout() -> Self {
        TextProgress::new(io::stdout())
    }
}

impl<W: Write> TextProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // Write errors are ignored.
    fn line(&self, text: std::fmt::Arguments<'_>) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = out.write_fmt(text);
        let _ = out.write_all(b"\n");
        let _ = out.flush();
    }
}

impl<W: Write> FetchProgress for TextProgress<W> {
    fn on_retry(&self, _channel: Channel, date: NaiveDate, _attempt: u32, _max: u32, reason: &str) {
        self.line(format_args!("{reason} error processing: {date} - retrying."));
    }
}

impl<W: Write> HarvestProgress for TextProgress<W> {
    fn on_channel_start(&self, channel: Channel, _window: &DateWindow) {
        self.line(format_args!("{}", "-".repeat(RULE_WIDTH)));
        self.line(format_args!("Start processing {channel}:\n"));
    }

    fn on_day_complete(&self, channel: Channel, date: NaiveDate, _stats: &RouteStats) {
        self.line(format_args!("Processed {channel}: {date}"));
    }

    fn on_run_complete(&self, report: &RunReport) {
        self.line(format_args!("{}", "-".repeat(RULE_WIDTH)));
        self.line(format_args!("Finished.\n"));
        for stop in report.soft_stops() {
            self.line(format_args!("{stop}"));
        }
    }
}
