//! Cleaning of raw live-snapshot rows into canonical [`PriceRow`]s.
//!
//! Raw rows come from an opaque producer and may carry stray whitespace,
//! thousands separators, currency marks or missing cells. Nothing here fails:
//! bad prices become `0.0` and rows without a market or commodity are dropped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::source::SnapshotFeed;

/// A live snapshot row exactly as the producer emitted it.
///
/// Column names follow the live feed (`state, APMC, Commodity, Min_Price,
/// Modal_Price, Max_Price`); snake-case names are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawPriceRow {
    #[serde(default, alias = "State")]
    pub state: String,
    #[serde(default, rename = "APMC", alias = "market", alias = "Market")]
    pub market: String,
    #[serde(default, rename = "Commodity", alias = "commodity")]
    pub commodity: String,
    #[serde(default, rename = "Min_Price", alias = "min_price")]
    pub min_price: String,
    #[serde(default, rename = "Modal_Price", alias = "modal_price")]
    pub modal_price: String,
    #[serde(default, rename = "Max_Price", alias = "max_price")]
    pub max_price: String,
}

impl RawPriceRow {
    /// Builds a row from positional cells, padding short rows with empty cells.
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Self {
        let cell = |i: usize| cells.get(i).map(|c| c.as_ref().to_string()).unwrap_or_default();
        RawPriceRow {
            state: cell(0),
            market: cell(1),
            commodity: cell(2),
            min_price: cell(3),
            modal_price: cell(4),
            max_price: cell(5),
        }
    }
}

/// A cleaned price row.
///
/// `min_price <= modal_price <= max_price` is not guaranteed; the source
/// publishes whatever the market reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRow {
    /// Trimmed state as published, for display.
    pub state: String,
    /// Uppercased state, for comparison and grouping.
    pub state_key: String,
    pub market: String,
    pub commodity: String,
    pub min_price: f64,
    pub modal_price: f64,
    pub max_price: f64,
}

/// All rows captured at one retrieval instant. Empty means "no data".
pub type Snapshot = Vec<PriceRow>;

/// Uppercased, trimmed comparison form of a state name.
pub fn state_key(state: &str) -> String {
    state.trim().to_uppercase()
}

/// Currency marks that may lead a published price.
const CURRENCY_PREFIXES: &[&str] = &["₹", "Rs.", "Rs", "INR"];

/// Parses a published price such as `"3,450"` or `"₹ 2,150.50"`.
///
/// Only whitespace, thousands separators and one leading currency mark are
/// removed. Anything else left over (a sign, an exponent, a second number)
/// makes the cell unreadable and returns `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    let digits = CURRENCY_PREFIXES
        .iter()
        .find_map(|prefix| cleaned.strip_prefix(*prefix))
        .unwrap_or(cleaned.as_str());

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    digits.parse::<f64>().ok().filter(|p| p.is_finite())
}

fn price_or_zero(raw: &str, field: &'static str, market: &str) -> f64 {
    match parse_price(raw) {
        Some(p) => p,
        None => {
            debug!(field, market, raw, "Unparseable price, using 0");
            0.0
        }
    }
}

/// Normalizes one raw row. Returns `None` when market or commodity is blank.
pub fn normalize_row(raw: &RawPriceRow) -> Option<PriceRow> {
    let market = raw.market.trim();
    let commodity = raw.commodity.trim();

    if market.is_empty() || commodity.is_empty() {
        debug!(?raw, "Dropping row without market or commodity");
        return None;
    }

    let state = raw.state.trim();

    Some(PriceRow {
        state: state.to_string(),
        state_key: state.to_uppercase(),
        market: market.to_string(),
        commodity: commodity.to_string(),
        min_price: price_or_zero(&raw.min_price, "min_price", market),
        modal_price: price_or_zero(&raw.modal_price, "modal_price", market),
        max_price: price_or_zero(&raw.max_price, "max_price", market),
    })
}

/// Normalizes a batch of raw rows, preserving their order.
pub fn normalize_rows(raw: &[RawPriceRow]) -> Snapshot {
    let rows: Snapshot = raw.iter().filter_map(normalize_row).collect();

    debug!(
        raw = raw.len(),
        kept = rows.len(),
        dropped = raw.len() - rows.len(),
        "Snapshot normalized"
    );

    rows
}

/// Normalizes whatever the snapshot producer returned. An unavailable source
/// is the same as an empty one.
pub fn normalize_feed(feed: &SnapshotFeed) -> Snapshot {
    match feed {
        SnapshotFeed::Rows(raw) => normalize_rows(raw),
        SnapshotFeed::Unavailable => Vec::new(),
    }
}

/// Rows whose state matches `state` case-insensitively. A blank filter keeps
/// every row.
pub fn filter_by_state<'a>(rows: &'a [PriceRow], state: &str) -> Vec<&'a PriceRow> {
    let key = state_key(state);
    rows.iter()
        .filter(|r| key.is_empty() || r.state_key == key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(state: &str, market: &str, commodity: &str, modal: &str) -> RawPriceRow {
        RawPriceRow::from_cells(&[state, market, commodity, "1,000", modal, "9,999"])
    }

    #[test]
    fn test_parse_price_strips_thousands_separators() {
        assert_eq!(parse_price("3,450"), Some(3450.0));
        assert_eq!(parse_price(" 1,23,456.5 "), Some(123456.5));
    }

    #[test]
    fn test_parse_price_rejects_non_numeric() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("NA"), None);
        assert_eq!(parse_price("1.2.3"), None);
    }

    #[test]
    fn test_parse_price_strips_currency_marks() {
        assert_eq!(parse_price("Rs. 2150"), Some(2150.0));
        assert_eq!(parse_price("₹2,150"), Some(2150.0));
        assert_eq!(parse_price("₹ 2,150.50"), Some(2150.5));
    }

    #[test]
    fn test_parse_price_rejects_ranges_signs_and_exponents() {
        assert_eq!(parse_price("2100-2300"), None);
        assert_eq!(parse_price("2,150 - 2,300"), None);
        assert_eq!(parse_price("-500"), None);
        assert_eq!(parse_price("+500"), None);
        assert_eq!(parse_price("1e3"), None);
        assert_eq!(parse_price("inf"), None);
        assert_eq!(parse_price("2150 2300"), None);
    }

    #[test]
    fn test_range_cell_ranks_at_zero() {
        use crate::ranking::{Scope, SortOrder, top_n};

        let rows = normalize_rows(&[
            raw("Punjab", "Ludhiana", "Wheat", "2,150"),
            raw("Punjab", "Khanna", "Wheat", "2100-2300"),
        ]);

        let subset = top_n(&rows, "Wheat", 1, SortOrder::Descending, Scope::National);
        assert_eq!(subset.entries[0].label, "Ludhiana, Punjab");
        assert_eq!(rows[1].modal_price, 0.0);
    }

    #[test]
    fn test_normalize_row_trims_and_uppercases_state_key() {
        let row = normalize_row(&raw("  Punjab ", " Ludhiana Mandi", "Wheat  ", "2,150")).unwrap();

        assert_eq!(row.state, "Punjab");
        assert_eq!(row.state_key, "PUNJAB");
        assert_eq!(row.market, "Ludhiana Mandi");
        assert_eq!(row.commodity, "Wheat");
        assert_eq!(row.min_price, 1000.0);
        assert_eq!(row.modal_price, 2150.0);
        assert_eq!(row.max_price, 9999.0);
    }

    #[test]
    fn test_normalize_row_zeroes_bad_prices() {
        let row = normalize_row(&raw("Punjab", "Ludhiana", "Wheat", "n/a")).unwrap();
        assert_eq!(row.modal_price, 0.0);
    }

    #[test]
    fn test_normalize_row_drops_blank_market_or_commodity() {
        assert!(normalize_row(&raw("Punjab", "   ", "Wheat", "10")).is_none());
        assert!(normalize_row(&raw("Punjab", "Ludhiana", "", "10")).is_none());
    }

    #[test]
    fn test_from_cells_pads_short_rows() {
        let row = RawPriceRow::from_cells(&["Punjab", "Ludhiana", "Wheat"]);
        assert_eq!(row.modal_price, "");

        let normalized = normalize_row(&row).unwrap();
        assert_eq!(normalized.min_price, 0.0);
        assert_eq!(normalized.modal_price, 0.0);
        assert_eq!(normalized.max_price, 0.0);
    }

    #[test]
    fn test_normalize_rows_preserves_order() {
        let rows = normalize_rows(&[
            raw("Punjab", "B", "Wheat", "2"),
            raw("Punjab", "", "Wheat", "3"),
            raw("Punjab", "A", "Wheat", "1"),
        ]);

        let markets: Vec<_> = rows.iter().map(|r| r.market.as_str()).collect();
        assert_eq!(markets, vec!["B", "A"]);
    }

    #[test]
    fn test_normalize_feed_unavailable_is_empty() {
        assert!(normalize_feed(&SnapshotFeed::Unavailable).is_empty());
        assert!(normalize_feed(&SnapshotFeed::Rows(vec![])).is_empty());
    }

    #[test]
    fn test_filter_by_state_is_case_insensitive() {
        let rows = normalize_rows(&[
            raw("Punjab", "Ludhiana", "Wheat", "2"),
            raw("Haryana", "Karnal", "Wheat", "3"),
        ]);

        let punjab = filter_by_state(&rows, " punjab");
        assert_eq!(punjab.len(), 1);
        assert_eq!(punjab[0].market, "Ludhiana");

        assert_eq!(filter_by_state(&rows, "").len(), 2);
    }
}
