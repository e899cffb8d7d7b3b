//! One archive day through the core pipeline: fetch, decompress, route, write.

use chrono::NaiveDate;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;

use bmex_core::data::{
    decompress, fetch_archive, route_day, ArchiveResponse, ArchiveSource, FetchOutcome,
    FsPartitionSink, RetryPolicy, SilentProgress, TransportError,
};
use bmex_core::domain::{Channel, PartitionKey, SymbolSet};

const QUOTES: &str = "\
timestamp,symbol,bidSize,bidPrice,askPrice,askSize
2019-03-01D00:00:00.012000000,XBTUSD,4100,3816.5,3817,95630
2019-03-01D00:00:00.250000000,ETHUSD,12,135.3,135.35,4021
2019-03-01D00:00:01.007000000,XBTUSD,4100,3816.5,3817,96630
";

struct OneDay(Vec<u8>);

impl ArchiveSource for OneDay {
    fn name(&self) -> &str {
        "one-day"
    }

    fn get(&self, _: Channel, _: NaiveDate) -> Result<ArchiveResponse, TransportError> {
        Ok(ArchiveResponse::ok(self.0.clone()))
    }
}

fn gzip(text: &str) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::best());
    enc.write_all(text.as_bytes()).unwrap();
    enc.finish().unwrap()
}

#[test]
fn quote_day_lands_in_partitioned_tree() {
    let date = NaiveDate::from_ymd_opt(2019, 3, 1).unwrap();
    let today = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let out = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();

    let source = OneDay(gzip(QUOTES));
    let archive = match fetch_archive(
        &source,
        Channel::Quote,
        date,
        RetryPolicy::immediate(1),
        today,
        &SilentProgress,
    )
    .unwrap()
    {
        FetchOutcome::Fetched(archive) => archive,
        other => panic!("expected archive, got {other:?}"),
    };

    let spool = decompress(&archive, Some(scratch.path())).unwrap();
    assert_eq!(spool.len(), QUOTES.len() as u64);
    let spool_path = spool.path().to_path_buf();
    assert!(spool_path.starts_with(scratch.path()));

    let symbols = SymbolSet::new(["xbtusd"]).unwrap();
    let mut sink = FsPartitionSink::new(out.path());
    let stats = route_day(spool.reader().unwrap(), Channel::Quote, date, &symbols, &mut sink).unwrap();
    drop(spool);

    assert_eq!(stats.rows_kept, 2);
    assert!(!spool_path.exists());

    let key = PartitionKey::new("XBTUSD", Channel::Quote, date);
    let path = key.path_under(out.path());
    assert!(path.ends_with("BITMEX/XBTUSD/quotes/2019/3/2019-03-01.csv"));
    assert_eq!(
        fs::read_to_string(path).unwrap(),
        "2019-03-01 00:00:00.012000000,XBTUSD,4100,3816.5,3817,95630\r\n\
         2019-03-01 00:00:01.007000000,XBTUSD,4100,3816.5,3817,96630\r\n"
    );
    assert!(!out.path().join("BITMEX/ETHUSD").exists());
}
