use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::warn;

/// Maps live-feed commodity names to the names used by the archive.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// {
///   "WHEAT": "Wheat",
///   "PADDY(DHAN)(COMMON)": "Paddy(Dhan)(Common)"
/// }
/// ```
/// Keys are matched on their trimmed, uppercased form.
#[derive(Debug, Clone, Default)]
pub struct CommodityNameMap {
    entries: HashMap<String, String>,
}

impl CommodityNameMap {
    /// Loads the table from a JSON file at `path`. A missing file gives an
    /// empty table, so every lookup reports a translation gap.
    pub fn load(path: &str) -> Result<Self> {
        if !std::path::Path::new(path).exists() {
            warn!(path, "Commodity name map not found, no crop will translate");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read name map '{path}'"))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let entries: HashMap<String, String> =
            serde_json::from_str(content).context("name map is not a JSON object of strings")?;
        Ok(Self::from_pairs(entries))
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_uppercase(), v.into()))
            .collect();
        Self { entries }
    }

    /// Returns the archive spelling for a live-feed commodity name.
    pub fn translate(&self, commodity: &str) -> Option<&str> {
        self.entries
            .get(&commodity.trim().to_uppercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
