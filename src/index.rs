//! Dropdown indices over one snapshot.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::normalize::PriceRow;

/// Bidirectional crop/state lookups derived from exactly one snapshot.
///
/// Always rebuilt from scratch with [`build_index`]. All value collections are
/// ordered, so enumerating them is stable across rebuilds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommodityIndex {
    pub commodity_to_markets: BTreeMap<String, BTreeSet<String>>,
    /// States are keyed by their uppercased form.
    pub commodity_to_states: BTreeMap<String, BTreeSet<String>>,
    pub state_to_commodities: BTreeMap<String, BTreeSet<String>>,
    pub commodity_market_price: BTreeMap<String, BTreeMap<String, f64>>,
}

impl CommodityIndex {
    pub fn is_empty(&self) -> bool {
        self.commodity_to_markets.is_empty()
            && self.commodity_to_states.is_empty()
            && self.state_to_commodities.is_empty()
            && self.commodity_market_price.is_empty()
    }

    /// Distinct commodities, sorted.
    pub fn commodities(&self) -> Vec<&str> {
        self.commodity_to_states.keys().map(String::as_str).collect()
    }

    /// Distinct (uppercased) states, sorted.
    pub fn states(&self) -> Vec<&str> {
        self.state_to_commodities.keys().map(String::as_str).collect()
    }

    pub fn markets_for(&self, commodity: &str) -> Option<&BTreeSet<String>> {
        self.commodity_to_markets.get(commodity)
    }

    pub fn states_for(&self, commodity: &str) -> Option<&BTreeSet<String>> {
        self.commodity_to_states.get(commodity)
    }

    pub fn commodities_in(&self, state: &str) -> Option<&BTreeSet<String>> {
        self.state_to_commodities.get(&state.trim().to_uppercase())
    }

    pub fn price_at(&self, commodity: &str, market: &str) -> Option<f64> {
        self.commodity_market_price
            .get(commodity)
            .and_then(|m| m.get(market))
            .copied()
    }
}

/// Returns the spelling already on record for `commodity` ignoring case, or
/// records this one.
fn canonical<'a>(seen: &'a mut Vec<String>, commodity: &str) -> &'a str {
    let pos = match seen.iter().position(|c| c.eq_ignore_ascii_case(commodity)) {
        Some(pos) => pos,
        None => {
            seen.push(commodity.to_string());
            seen.len() - 1
        }
    };
    &seen[pos]
}

/// Builds all four mappings from a snapshot.
///
/// Commodity spellings that differ only in case collapse onto the first
/// spelling seen. When a commodity is listed twice for the same market the
/// first listed price is kept.
pub fn build_index(rows: &[PriceRow]) -> CommodityIndex {
    let mut index = CommodityIndex::default();
    let mut spellings: Vec<String> = Vec::new();

    for row in rows {
        let commodity = canonical(&mut spellings, &row.commodity).to_string();

        index
            .commodity_to_markets
            .entry(commodity.clone())
            .or_default()
            .insert(row.market.clone());

        index
            .commodity_to_states
            .entry(commodity.clone())
            .or_default()
            .insert(row.state_key.clone());

        index
            .state_to_commodities
            .entry(row.state_key.clone())
            .or_default()
            .insert(commodity.clone());

        index
            .commodity_market_price
            .entry(commodity)
            .or_default()
            .entry(row.market.clone())
            .or_insert(row.modal_price);
    }

    debug!(
        rows = rows.len(),
        commodities = index.commodity_to_states.len(),
        states = index.state_to_commodities.len(),
        "Commodity index built"
    );

    index
}
