//! Revenue after transport, for the chosen market and for alternatives.

use serde::Serialize;

use crate::ranking::{RankedSubset, Scope};

/// How the cost of moving the produce is given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportCost {
    Flat(f64),
    Mileage { distance: f64, rate: f64 },
}

impl TransportCost {
    /// Mileage inputs win when both are supplied; otherwise the flat cost,
    /// defaulting to zero.
    pub fn from_inputs(flat: Option<f64>, distance: Option<f64>, rate: Option<f64>) -> Self {
        match (distance, rate) {
            (Some(distance), Some(rate)) => TransportCost::Mileage { distance, rate },
            _ => TransportCost::Flat(flat.unwrap_or(0.0)),
        }
    }

    pub fn amount(&self) -> f64 {
        match *self {
            TransportCost::Flat(cost) => cost,
            TransportCost::Mileage { distance, rate } => distance * rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransportResult {
    pub gross_revenue: f64,
    pub transport_cost: f64,
    pub net_revenue: f64,
    pub profit_per_unit: f64,
}

/// The same trip priced at another market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketProjection {
    #[serde(flatten)]
    pub scope: Scope,
    pub label: String,
    pub price: f64,
    pub result: TransportResult,
    /// Net revenue compared to the baseline sale; positive means better.
    pub gain: f64,
}

/// Selling `quantity` units at `price` after paying `cost`.
///
/// `profit_per_unit` is zero when `quantity` is not positive.
pub fn calculate(quantity: f64, price: f64, cost: TransportCost) -> TransportResult {
    let gross_revenue = quantity * price;
    let transport_cost = cost.amount();
    let net_revenue = gross_revenue - transport_cost;
    let profit_per_unit = if quantity > 0.0 {
        net_revenue / quantity
    } else {
        0.0
    };

    TransportResult {
        gross_revenue,
        transport_cost,
        net_revenue,
        profit_per_unit,
    }
}

/// Applies [`calculate`] to every market in `subsets`, comparing each to
/// `baseline`.
///
/// Meant for the descending top-5 lists; projections follow the subsets'
/// entry order.
pub fn project_alternatives(
    quantity: f64,
    cost: TransportCost,
    baseline: &TransportResult,
    subsets: &[&RankedSubset],
) -> Vec<MarketProjection> {
    subsets
        .iter()
        .copied()
        .flat_map(|subset| subset.entries.iter().map(move |e| (&subset.scope, e)))
        .map(|(scope, entry)| {
            let result = calculate(quantity, entry.price, cost);
            MarketProjection {
                scope: scope.clone(),
                label: entry.label.clone(),
                price: entry.price,
                gain: result.net_revenue - baseline.net_revenue,
                result,
            }
        })
        .collect()
}
