//! Historical price series and their alignment.
//!
//! The archive names crops differently from the live feed, so every lookup
//! goes through a [`CommodityNameMap`] first. Monthly averages for the
//! country, one state and each of that state's markets are then laid out on a
//! shared set of month labels so they chart on one axis.

pub mod aligner;
pub mod name_map;
pub mod series;
pub mod types;

pub use aligner::{align, align_national};
pub use name_map::CommodityNameMap;
pub use series::{Month, MonthlySeries};
pub use types::{AlignError, ArchiveRow, HistoricalArchive, HistoricalView, StateHistory};
