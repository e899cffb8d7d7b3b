//! Partition sinks: where routed records end up.
//!
//! The router only decides *which* partition a record belongs to and when a
//! partition is touched for the first time; a sink decides what "reset" and
//! "append" mean. [`FsPartitionSink`] writes the on-disk tree,
//! [`MemorySink`] keeps everything in memory for tests.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::provider::DataError;
use crate::domain::{PartitionKey, Record};

/// Destination for routed records.
pub trait PartitionSink {
    /// Discard whatever the partition currently holds.
    fn reset(&mut self, key: &PartitionKey) -> Result<(), DataError>;

    /// Append one record to the partition, creating it if needed.
    fn append(&mut self, key: &PartitionKey, record: &Record) -> Result<(), DataError>;

    /// Flush and release anything buffered so far.
    fn finish(&mut self) -> Result<(), DataError>;
}

/// Writes partitions as CSV files under `{root}/BITMEX/...`, one record per
/// `\r\n`-terminated line.
///
/// Writers stay open between appends until [`PartitionSink::finish`].
pub struct FsPartitionSink {
    root: PathBuf,
    writers: HashMap<PartitionKey, (PathBuf, csv::Writer<BufWriter<File>>)>,
}

impl FsPartitionSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            writers: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn open(&self, key: &PartitionKey) -> Result<(PathBuf, csv::Writer<BufWriter<File>>), DataError> {
        let dir = self.root.join(key.relative_dir());
        fs::create_dir_all(&dir).map_err(|e| DataError::fs(&dir, e))?;

        let path = dir.join(key.file_name());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| DataError::fs(&path, e))?;

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(BufWriter::new(file));
        Ok((path, writer))
    }
}

impl PartitionSink for FsPartitionSink {
    fn reset(&mut self, key: &PartitionKey) -> Result<(), DataError> {
        if let Some((path, mut writer)) = self.writers.remove(key) {
            writer.flush().map_err(|e| DataError::fs(&path, e))?;
        }

        let path = key.path_under(&self.root);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed existing partition");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DataError::fs(&path, e)),
        }
    }

    fn append(&mut self, key: &PartitionKey, record: &Record) -> Result<(), DataError> {
        if !self.writers.contains_key(key) {
            let opened = self.open(key)?;
            self.writers.insert(key.clone(), opened);
        }
        if let Some((_, writer)) = self.writers.get_mut(key) {
            writer.write_record(record.columns())?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DataError> {
        for (_, (path, mut writer)) in self.writers.drain() {
            writer.flush().map_err(|e| DataError::fs(&path, e))?;
        }
        Ok(())
    }
}

/// In-memory sink. Behaves like a directory of files that survives across runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    partitions: BTreeMap<PartitionKey, Vec<Vec<String>>>,
    resets: Vec<PartitionKey>,
    finishes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows currently stored for `key`.
    pub fn rows(&self, key: &PartitionKey) -> Option<&[Vec<String>]> {
        self.partitions.get(key).map(|v| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &PartitionKey> {
        self.partitions.keys()
    }

    /// Every reset call, in order.
    pub fn resets(&self) -> &[PartitionKey] {
        &self.resets
    }

    pub fn finishes(&self) -> usize {
        self.finishes
    }
}

impl PartitionSink for MemorySink {
    fn reset(&mut self, key: &PartitionKey) -> Result<(), DataError> {
        self.partitions.remove(key);
        self.resets.push(key.clone());
        Ok(())
    }

    fn append(&mut self, key: &PartitionKey, record: &Record) -> Result<(), DataError> {
        self.partitions
            .entry(key.clone())
            .or_default()
            .push(record.columns().map(str::to_string).collect());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DataError> {
        self.finishes += 1;
        Ok(())
    }
}
