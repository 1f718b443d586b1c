//! Live snapshot producers.
//!
//! Scraping the live feed happens outside this crate; [`SnapshotSource`] is
//! the seam it plugs into.

mod client;
mod csv_file;

pub use client::{SnapshotFeed, SnapshotSource};
pub use csv_file::CsvSnapshotSource;
pub(crate) use csv_file::read_padded;

use crate::normalize::{Snapshot, normalize_feed};

/// Pulls a feed from `source` and normalizes it.
pub fn fetch_snapshot<S: SnapshotSource + ?Sized>(source: &S, commodity: Option<&str>) -> Snapshot {
    let feed = source.fetch(commodity);
    normalize_feed(&feed)
}
