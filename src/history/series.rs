//! Month keys, monthly averaging and reindexing onto shared labels.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use tracing::debug;

use super::types::ArchiveRow;
use crate::normalize::parse_price;

/// Archive date layouts, tried in order.
const DATE_FORMATS: &[&str] = &["%d %b %Y", "%d-%b-%Y", "%Y-%m-%d", "%d/%m/%Y"];

/// A calendar month. Orders chronologically and renders as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Average price per month.
pub type MonthlySeries = BTreeMap<Month, f64>;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Parses an archive date such as `15 Jan 2024`.
pub fn parse_price_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// The month and price a row contributes, or `None` if either is unreadable.
fn observation(row: &ArchiveRow) -> Option<(Month, f64)> {
    let Some(date) = parse_price_date(&row.price_date) else {
        debug!(date = %row.price_date, market = %row.market, "Dropping archive row with unparseable date");
        return None;
    };
    let Some(price) = parse_price(&row.modal_price) else {
        debug!(price = %row.modal_price, market = %row.market, "Dropping archive row with unparseable price");
        return None;
    };
    Some((Month::of(date), price))
}

/// Groups rows by calendar month and averages their modal price.
pub fn monthly_means<'a, I>(rows: I) -> MonthlySeries
where
    I: IntoIterator<Item = &'a ArchiveRow>,
{
    let mut by_month: BTreeMap<Month, Vec<f64>> = BTreeMap::new();

    for (month, price) in rows.into_iter().filter_map(observation) {
        by_month.entry(month).or_default().push(price);
    }

    by_month
        .into_iter()
        .map(|(month, prices)| (month, mean(&prices)))
        .collect()
}

/// Every month present in any of `series`, in chronological order.
pub fn union_labels<'a, I>(series: I) -> Vec<Month>
where
    I: IntoIterator<Item = &'a MonthlySeries>,
{
    series
        .into_iter()
        .flat_map(|s| s.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Lays `series` out along `labels`, `None` where it has no value.
pub fn reindex(series: &MonthlySeries, labels: &[Month]) -> Vec<Option<f64>> {
    labels.iter().map(|m| series.get(m).copied()).collect()
}
