use std::io::Read;
use std::path::PathBuf;

use csv::{Reader, ReaderBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::client::{SnapshotFeed, SnapshotSource};
use crate::normalize::RawPriceRow;

/// Deserializes every record, padding short rows with empty cells so that
/// trailing columns fall back to their defaults. Returns the rows and the
/// number of records that could not be read.
pub(crate) fn read_padded<R: Read, T: DeserializeOwned>(rdr: &mut Reader<R>) -> (Vec<T>, usize) {
    let headers = match rdr.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            debug!(error = %e, "CSV has no readable header");
            return (Vec::new(), 0);
        }
    };

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let parsed = result.and_then(|mut record| {
            while record.len() < headers.len() {
                record.push_field("");
            }
            record.deserialize::<T>(Some(&headers))
        });

        match parsed {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                debug!(error = %e, "Skipping unreadable CSV row");
            }
        }
    }

    (rows, skipped)
}

/// Reads a snapshot previously captured to a CSV file.
///
/// A missing or unreadable file yields [`SnapshotFeed::Unavailable`]; rows
/// that fail to deserialize are skipped.
pub struct CsvSnapshotSource {
    path: PathBuf,
}

impl CsvSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for CsvSnapshotSource {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn fetch(&self, commodity: Option<&str>) -> SnapshotFeed {
        let mut rdr = match ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_path(&self.path)
        {
            Ok(rdr) => rdr,
            Err(e) => {
                warn!(error = %e, "Snapshot source unavailable");
                return SnapshotFeed::Unavailable;
            }
        };

        let wanted = commodity.map(|c| c.trim().to_lowercase());
        let (rows, skipped) = read_padded::<_, RawPriceRow>(&mut rdr);
        let rows: Vec<RawPriceRow> = rows
            .into_iter()
            .filter(|row| {
                wanted
                    .as_ref()
                    .is_none_or(|w| row.commodity.trim().to_lowercase() == *w)
            })
            .collect();

        debug!(rows = rows.len(), skipped, "Snapshot read");
        SnapshotFeed::Rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let source = CsvSnapshotSource::new(temp_path("mandi_prices_no_such_snapshot.csv"));
        assert_eq!(source.fetch(None), SnapshotFeed::Unavailable);
    }

    #[test]
    fn test_reads_live_feed_columns() {
        let path = temp_path("mandi_prices_test_snapshot.csv");
        fs::write(
            &path,
            "state,APMC,Commodity,Min_Price,Modal_Price,Max_Price\n\
             Punjab,Ludhiana Mandi,Wheat,2000,\"2,150\",2300\n\
             Haryana,Karnal,Rice,3000,3200,3400\n",
        )
        .unwrap();

        let feed = CsvSnapshotSource::new(&path).fetch(None);
        let SnapshotFeed::Rows(rows) = feed else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].market, "Ludhiana Mandi");
        assert_eq!(rows[0].modal_price, "2,150");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_commodity_filter() {
        let path = temp_path("mandi_prices_test_snapshot_filter.csv");
        fs::write(
            &path,
            "state,market,commodity,min_price,modal_price,max_price\n\
             Punjab,Ludhiana Mandi,Wheat,2000,2150,2300\n\
             Haryana,Karnal,Rice,3000,3200,3400\n",
        )
        .unwrap();

        let feed = CsvSnapshotSource::new(&path).fetch(Some("wheat"));
        let SnapshotFeed::Rows(rows) = feed else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].commodity, "Wheat");

        fs::remove_file(&path).unwrap();
    }
}
