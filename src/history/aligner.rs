use std::collections::BTreeMap;

use tracing::{debug, info};

use super::name_map::CommodityNameMap;
use super::series::{MonthlySeries, monthly_means, reindex, union_labels};
use super::types::{AlignError, ArchiveRow, HistoricalArchive, HistoricalView, StateHistory};
use crate::normalize::state_key;

/// Translates `commodity` and collects its archive rows.
fn crop_rows<'a>(
    archive: &'a HistoricalArchive,
    commodity: &str,
    name_map: &CommodityNameMap,
) -> Result<(String, Vec<&'a ArchiveRow>), AlignError> {
    let archive_commodity = name_map
        .translate(commodity)
        .ok_or_else(|| AlignError::TranslationGap {
            commodity: commodity.to_string(),
        })?;

    let wanted = archive_commodity.trim();
    let rows: Vec<&ArchiveRow> = archive
        .rows()
        .iter()
        .filter(|r| r.commodity.trim().eq_ignore_ascii_case(wanted))
        .collect();

    if rows.is_empty() {
        return Err(AlignError::CropNotAvailable {
            commodity: commodity.to_string(),
        });
    }

    debug!(archive_commodity = wanted, rows = rows.len(), "Archive rows for crop");
    Ok((wanted.to_string(), rows))
}

/// Builds the national-only view for `commodity`.
///
/// Used on its own when the caller falls back after
/// [`AlignError::NoStateData`].
#[tracing::instrument(skip(archive, name_map))]
pub fn align_national(
    archive: &HistoricalArchive,
    commodity: &str,
    name_map: &CommodityNameMap,
) -> Result<HistoricalView, AlignError> {
    let (archive_commodity, rows) = crop_rows(archive, commodity, name_map)?;

    let national = monthly_means(rows);
    let labels = union_labels([&national]);

    Ok(HistoricalView {
        commodity: commodity.to_string(),
        archive_commodity,
        national: reindex(&national, &labels),
        labels,
        state: None,
    })
}

/// Builds the national, state and per-market monthly series for one crop,
/// all laid out on the same month labels.
///
/// The three failure kinds are checked in order: the crop has no archive
/// name, the archive has no rows for it, the state has no rows for it.
#[tracing::instrument(skip(archive, name_map))]
pub fn align(
    archive: &HistoricalArchive,
    commodity: &str,
    state: &str,
    name_map: &CommodityNameMap,
) -> Result<HistoricalView, AlignError> {
    let (archive_commodity, rows) = crop_rows(archive, commodity, name_map)?;

    let national = monthly_means(rows.iter().copied());

    let key = state_key(state);
    let state_rows: Vec<&ArchiveRow> = rows
        .iter()
        .copied()
        .filter(|r| state_key(&r.state) == key)
        .collect();

    if state_rows.is_empty() {
        return Err(AlignError::NoStateData {
            commodity: commodity.to_string(),
            state: state.trim().to_string(),
        });
    }

    let state_series = monthly_means(state_rows.iter().copied());

    // keyed case-insensitively, displayed with the first spelling seen
    let mut by_market: BTreeMap<String, (&str, Vec<&ArchiveRow>)> = BTreeMap::new();
    for row in state_rows.iter().copied() {
        let market = row.market.trim();
        if market.is_empty() {
            continue;
        }
        by_market
            .entry(market.to_uppercase())
            .or_insert_with(|| (market, Vec::new()))
            .1
            .push(row);
    }

    let market_series: BTreeMap<String, MonthlySeries> = by_market
        .into_values()
        .map(|(market, rows)| (market.to_string(), monthly_means(rows)))
        .collect();

    // market months are a subset of the state's
    let labels = union_labels([&national, &state_series]);

    let markets = market_series
        .iter()
        .map(|(market, series)| (market.clone(), reindex(series, &labels)))
        .collect();

    info!(
        archive_commodity = %archive_commodity,
        months = labels.len(),
        markets = market_series.len(),
        "Historical view aligned"
    );

    Ok(HistoricalView {
        commodity: commodity.to_string(),
        archive_commodity,
        national: reindex(&national, &labels),
        state: Some(StateHistory {
            state: state.trim().to_string(),
            average: reindex(&state_series, &labels),
            markets,
        }),
        labels,
    })
}
