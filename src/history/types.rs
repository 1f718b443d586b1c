//! Data types used by the historical alignment pipeline.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::series::Month;
use crate::source::read_padded;

/// A single row of the monthly price archive.
///
/// Prices are kept as text; they are parsed during grouping so that one bad
/// cell only drops its own row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArchiveRow {
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Commodity", default)]
    pub commodity: String,
    #[serde(rename = "Market Name", alias = "Market", default)]
    pub market: String,
    /// Day, abbreviated month and year, e.g. `15 Jan 2024`.
    #[serde(rename = "Price Date", alias = "Arrival Date", default)]
    pub price_date: String,
    #[serde(rename = "Modal Price", alias = "Modal Price (Rs./Quintal)", default)]
    pub modal_price: String,
}

impl ArchiveRow {
    pub fn new(state: &str, commodity: &str, market: &str, price_date: &str, modal_price: &str) -> Self {
        ArchiveRow {
            state: state.to_string(),
            commodity: commodity.to_string(),
            market: market.to_string(),
            price_date: price_date.to_string(),
            modal_price: modal_price.to_string(),
        }
    }
}

/// The historical archive, loaded once and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct HistoricalArchive {
    rows: Vec<ArchiveRow>,
}

impl HistoricalArchive {
    pub fn from_rows(rows: Vec<ArchiveRow>) -> Self {
        Self { rows }
    }

    /// Reads an archive from CSV, skipping rows that cannot be deserialized.
    pub fn from_reader<R: Read>(reader: R) -> Self {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let (rows, skipped) = read_padded::<_, ArchiveRow>(&mut rdr);
        debug!(rows = rows.len(), skipped, "Archive read");
        Self { rows }
    }

    /// Loads the archive at `path`. A missing file gives an empty archive.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "Historical archive not found, continuing without it");
            return Ok(Self::default());
        }

        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open archive '{}'", path.display()))?;
        let archive = Self::from_reader(file);

        info!(path = %path.display(), rows = archive.len(), "Historical archive loaded");
        Ok(archive)
    }

    pub fn rows(&self) -> &[ArchiveRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// State-level series within a [`HistoricalView`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateHistory {
    pub state: String,
    pub average: Vec<Option<f64>>,
    /// One series per market quoting the crop in this state.
    pub markets: BTreeMap<String, Vec<Option<f64>>>,
}

/// Monthly averages for one crop, every series indexed by `labels`.
///
/// `None` marks a month a series has no data for; it serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalView {
    pub commodity: String,
    /// The crop's name in the archive.
    pub archive_commodity: String,
    pub labels: Vec<Month>,
    pub national: Vec<Option<f64>>,
    pub state: Option<StateHistory>,
}

impl HistoricalView {
    /// True when every series has exactly one value per label.
    pub fn is_aligned(&self) -> bool {
        let n = self.labels.len();
        self.national.len() == n
            && self.state.as_ref().is_none_or(|s| {
                s.average.len() == n && s.markets.values().all(|m| m.len() == n)
            })
    }
}

/// Why [`align`](super::aligner::align) could not build a view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlignError {
    #[error("historical data not mapped for {commodity}")]
    TranslationGap { commodity: String },
    #[error("{commodity} is not available in the historical archive")]
    CropNotAvailable { commodity: String },
    #[error("no data for {commodity} in {state}")]
    NoStateData { commodity: String, state: String },
}

impl AlignError {
    /// Stable reason code for callers that branch on the failure kind.
    pub fn reason(&self) -> &'static str {
        match self {
            AlignError::TranslationGap { .. } => "translation gap",
            AlignError::CropNotAvailable { .. } => "crop not available",
            AlignError::NoStateData { .. } => "no data for this selection",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader_archive_columns() {
        let csv = "State,Commodity,Market Name,Price Date,Modal Price\n\
                   Punjab,Wheat,Ludhiana,15 Jan 2024,2150\n\
                   Punjab,Wheat,Amritsar,20 Jan 2024,\"2,050\"\n";

        let archive = HistoricalArchive::from_reader(csv.as_bytes());

        assert_eq!(archive.len(), 2);
        assert_eq!(archive.rows()[1].market, "Amritsar");
        assert_eq!(archive.rows()[1].modal_price, "2,050");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let path = std::env::temp_dir().join("mandi_prices_no_such_archive.csv");
        let archive = HistoricalArchive::load(&path).unwrap();
        assert!(archive.is_empty());
    }

    #[test]
    fn test_reason_codes_are_distinct() {
        let gap = AlignError::TranslationGap { commodity: "Wheat".into() };
        let crop = AlignError::CropNotAvailable { commodity: "Wheat".into() };
        let state = AlignError::NoStateData {
            commodity: "Wheat".into(),
            state: "Kerala".into(),
        };

        assert_eq!(gap.reason(), "translation gap");
        assert_eq!(crop.reason(), "crop not available");
        assert_eq!(state.reason(), "no data for this selection");
        assert_eq!(gap.to_string(), "historical data not mapped for Wheat");
    }
}
