//! Domain types for the archive harvester

pub mod channel;
pub mod partition;
pub mod record;
pub mod symbols;
pub mod window;

pub use channel::Channel;
pub use partition::{PartitionKey, EXCHANGE_DIR};
pub use record::{normalize_timestamp, Record};
pub use symbols::SymbolSet;
pub use window::{dataset_start, is_recent, DateWindow};
