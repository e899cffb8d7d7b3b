//! Gzip expansion of one day's archive into a temporary spool file.
//!
//! Decompression runs to completion before any record is routed, so a corrupt
//! archive fails the day without touching the output tree. The spool file is
//! deleted when the [`Spool`] is dropped, whichever way the day ends.

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use super::provider::{DailyArchive, DataError};

const CHUNK: usize = 64 * 1024;

/// Decompressed archive body on disk.
#[derive(Debug)]
pub struct Spool {
    file: NamedTempFile,
    len: u64,
}

impl Spool {
    /// Fresh reader positioned at the start of the decompressed body.
    pub fn reader(&self) -> Result<BufReader<File>, DataError> {
        let file = self
            .file
            .reopen()
            .map_err(|e| DataError::fs(self.file.path(), e))?;
        Ok(BufReader::new(file))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Decompressed size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Expand `archive` into a spool file created in `scratch_dir`
/// (the system temp directory when `None`).
pub fn decompress(archive: &DailyArchive, scratch_dir: Option<&Path>) -> Result<Spool, DataError> {
    let date = archive.date;
    if archive.bytes.is_empty() {
        return Err(DataError::Decompression {
            date,
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "empty archive"),
        });
    }

    let prefix = format!(
        "bmex-{}-{}-",
        archive.channel.remote_name(),
        date.format("%Y%m%d")
    );
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".csv");
    let file = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir).map_err(|e| DataError::fs(dir, e))?,
        None => builder
            .tempfile()
            .map_err(|e| DataError::fs(std::env::temp_dir(), e))?,
    };

    let mut decoder = MultiGzDecoder::new(archive.bytes.as_slice());
    let mut out = BufWriter::new(file.as_file());
    let mut buf = vec![0u8; CHUNK];
    let mut len = 0u64;

    loop {
        let n = match decoder.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => return Err(DataError::Decompression { date, source }),
        };
        out.write_all(&buf[..n])
            .map_err(|e| DataError::fs(file.path(), e))?;
        len += n as u64;
    }
    out.flush().map_err(|e| DataError::fs(file.path(), e))?;
    drop(out);

    debug!(
        path = %file.path().display(),
        compressed = archive.bytes.len(),
        decompressed = len,
        "archive spooled"
    );
    Ok(Spool { file, len })
}
