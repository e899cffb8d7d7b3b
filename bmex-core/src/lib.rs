//! bmex core: domain types and the retrieval-and-partition pipeline.
//!
//! This crate contains everything needed to turn one day of BitMEX archive
//! data into partitioned CSV files:
//! - Domain types (channel, symbol set, date window, record, partition key)
//! - Capability traits for the archive bucket and the instrument catalog
//! - Fixed-delay bounded retry and the archive fetcher
//! - Gzip decompression into a self-cleaning spool file
//! - The record router and partition sinks

pub mod data;
pub mod domain;
