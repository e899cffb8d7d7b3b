//! bmex runner: harvest orchestration, configuration, progress and reports.
//!
//! This crate builds on `bmex-core` to provide:
//! - TOML configuration with production defaults
//! - The day-by-day harvester (validate, fetch, decompress, route)
//! - Progress callbacks and the stdout progress printer
//! - The per-channel run report

pub mod config;
pub mod harvester;
pub mod progress;
pub mod report;

pub use config::{ConfigError, HarvestConfig, RetrySettings};
pub use harvester::{HarvestError, HarvestRequest, Harvester, Stage};
pub use progress::{HarvestProgress, NullProgress, StdoutProgress, TextProgress};
pub use report::{ChannelStatus, RunReport};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<HarvestConfig>();
        assert_sync::<HarvestConfig>();
        assert_send::<RetrySettings>();
        assert_sync::<RetrySettings>();
    }

    #[test]
    fn request_is_send_sync() {
        assert_send::<HarvestRequest>();
        assert_sync::<HarvestRequest>();
    }

    #[test]
    fn report_is_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
        assert_send::<ChannelStatus>();
        assert_sync::<ChannelStatus>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<HarvestError>();
        assert_sync::<HarvestError>();
    }

    #[test]
    fn stdout_progress_is_send_sync() {
        assert_send::<StdoutProgress>();
        assert_sync::<StdoutProgress>();
    }
}
