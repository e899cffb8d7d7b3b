//! Run report: what happened to each requested channel.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use bmex_core::domain::{Channel, DateWindow};

/// Final state of one channel after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Every day in the window was fetched and routed.
    Completed { days: u32, rows: u64 },

    /// The channel stopped at `date` because its archive is not published yet.
    /// Days before `date` were processed normally.
    Unavailable {
        date: NaiveDate,
        http_status: u16,
        days: u32,
        rows: u64,
    },
}

impl ChannelStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, ChannelStatus::Completed { .. })
    }

    pub fn days(&self) -> u32 {
        match self {
            ChannelStatus::Completed { days, .. } | ChannelStatus::Unavailable { days, .. } => *days,
        }
    }

    pub fn rows(&self) -> u64 {
        match self {
            ChannelStatus::Completed { rows, .. } | ChannelStatus::Unavailable { rows, .. } => *rows,
        }
    }

    /// The message shown for a soft stop, `None` for a completed channel.
    pub fn soft_stop_message(&self) -> Option<String> {
        match self {
            ChannelStatus::Completed { .. } => None,
            ChannelStatus::Unavailable { date, .. } => Some(format!(
                "Failed to download: {date} - data not (yet) available."
            )),
        }
    }
}

/// Summary of one harvest invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub window: DateWindow,
    pub symbols: Vec<String>,
    pub channels: BTreeMap<Channel, ChannelStatus>,
}

impl RunReport {
    pub fn new(window: DateWindow, symbols: Vec<String>) -> Self {
        Self {
            window,
            symbols,
            channels: BTreeMap::new(),
        }
    }

    /// True when no channel was cut short.
    pub fn is_complete(&self) -> bool {
        self.channels.values().all(ChannelStatus::is_completed)
    }

    pub fn total_rows(&self) -> u64 {
        self.channels.values().map(ChannelStatus::rows).sum()
    }

    /// Soft-stop lines, `trades: Failed to download: ...`, in channel order.
    pub fn soft_stops(&self) -> Vec<String> {
        self.channels
            .iter()
            .filter_map(|(channel, status)| {
                status
                    .soft_stop_message()
                    .map(|msg| format!("{channel}: {msg}"))
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.soft_stops() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
