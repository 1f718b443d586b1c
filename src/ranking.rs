//! Top-N market rankings by modal price.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::normalize::{PriceRow, state_key};

/// How many markets the comparison views show per list.
pub const COMPARE_TOP_N: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Whether a ranking spans every state or only one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "scope", content = "state")]
pub enum Scope {
    National,
    State(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::National => write!(f, "national"),
            Scope::State(s) => write!(f, "state:{}", state_key(s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub label: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSubset {
    #[serde(flatten)]
    pub scope: Scope,
    pub order: SortOrder,
    pub entries: Vec<RankedEntry>,
}

impl RankedSubset {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Flattens the subset into CSV rows that each carry their scope.
    pub fn records(&self) -> Vec<RankedRecord> {
        let (scope, state) = match &self.scope {
            Scope::National => ("national", None),
            Scope::State(s) => ("state", Some(s.trim().to_string())),
        };

        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| RankedRecord {
                scope,
                state: state.clone(),
                order: self.order,
                rank: i + 1,
                label: e.label.clone(),
                price: e.price,
            })
            .collect()
    }
}

/// One ranked entry as a flat row, for CSV export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecord {
    pub scope: &'static str,
    pub state: Option<String>,
    pub order: SortOrder,
    pub rank: usize,
    pub label: String,
    pub price: f64,
}

/// Highest and lowest priced markets for one commodity, nationally and
/// within one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketComparison {
    pub commodity: String,
    pub national_highest: RankedSubset,
    pub national_lowest: RankedSubset,
    pub state_highest: Option<RankedSubset>,
    pub state_lowest: Option<RankedSubset>,
}

/// `"UTTAR PRADESH"` -> `"Uttar Pradesh"`.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn label(row: &PriceRow, scope: &Scope) -> String {
    match scope {
        Scope::National => format!("{}, {}", row.market, title_case(&row.state)),
        Scope::State(_) => row.market.clone(),
    }
}

/// Ranks the markets quoting `commodity` by modal price.
///
/// Ties keep snapshot order. A missing commodity, a state with no rows or
/// `n == 0` all give an empty subset.
pub fn top_n(
    rows: &[PriceRow],
    commodity: &str,
    n: usize,
    order: SortOrder,
    scope: Scope,
) -> RankedSubset {
    let state = match &scope {
        Scope::State(s) => Some(state_key(s)),
        Scope::National => None,
    };

    let mut matching: Vec<&PriceRow> = rows
        .iter()
        .filter(|r| r.commodity == commodity)
        .filter(|r| state.as_ref().is_none_or(|s| r.state_key == *s))
        .collect();

    // sort_by is stable
    match order {
        SortOrder::Ascending => matching.sort_by(|a, b| a.modal_price.total_cmp(&b.modal_price)),
        SortOrder::Descending => matching.sort_by(|a, b| b.modal_price.total_cmp(&a.modal_price)),
    }

    let entries: Vec<RankedEntry> = matching
        .into_iter()
        .take(n)
        .map(|r| RankedEntry {
            label: label(r, &scope),
            price: r.modal_price,
        })
        .collect();

    debug!(commodity, %scope, ?order, n, found = entries.len(), "Ranked markets");

    RankedSubset {
        scope,
        order,
        entries,
    }
}

/// Builds the top-5 highest and lowest lists at national scope and, when a
/// state is given, at state scope.
#[tracing::instrument(skip(rows), fields(rows = rows.len()))]
pub fn compare_markets(rows: &[PriceRow], commodity: &str, state: Option<&str>) -> MarketComparison {
    let state = state.map(str::trim).filter(|s| !s.is_empty());
    let ranked = |order: SortOrder, scope: Scope| top_n(rows, commodity, COMPARE_TOP_N, order, scope);

    MarketComparison {
        commodity: commodity.to_string(),
        national_highest: ranked(SortOrder::Descending, Scope::National),
        national_lowest: ranked(SortOrder::Ascending, Scope::National),
        state_highest: state.map(|s| ranked(SortOrder::Descending, Scope::State(s.to_string()))),
        state_lowest: state.map(|s| ranked(SortOrder::Ascending, Scope::State(s.to_string()))),
    }
}
