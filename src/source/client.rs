use crate::normalize::RawPriceRow;

/// What a snapshot producer handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotFeed {
    Rows(Vec<RawPriceRow>),
    /// The producer could not reach its source. Treated exactly like an empty
    /// snapshot downstream.
    Unavailable,
}

/// Producer of live price snapshots.
///
/// Implementations own all I/O; the engine only ever sees the returned
/// [`SnapshotFeed`]. `commodity` narrows the capture when the producer
/// supports it, `None` asks for everything.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self, commodity: Option<&str>) -> SnapshotFeed;
}
