//! CLI entry point for the mandi price engine.
//!
//! Provides subcommands for building dropdown indices from a live snapshot,
//! ranking and comparing markets, aligning historical monthly series, and
//! pricing transport to alternate markets.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use mandi_prices::history::{
    AlignError, CommodityNameMap, HistoricalArchive, HistoricalView, align, align_national,
};
use mandi_prices::index::{CommodityIndex, build_index};
use mandi_prices::output::{append_records, print_json, print_pretty};
use mandi_prices::ranking::{COMPARE_TOP_N, Scope, SortOrder, compare_markets, top_n};
use mandi_prices::source::{CsvSnapshotSource, fetch_snapshot};
use mandi_prices::transport::{
    MarketProjection, TransportCost, TransportResult, calculate, project_alternatives,
};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_ARCHIVE_PATH: &str = "data/archive.csv";
const DEFAULT_NAME_MAP_PATH: &str = "data/name_map.json";

#[derive(Parser)]
#[command(name = "mandi_prices")]
#[command(about = "Reconcile live and historical mandi commodity prices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the crop/state dropdown indices from a snapshot
    Index {
        /// Snapshot CSV captured from the live feed
        #[arg(short, long, default_value = "snapshot.csv")]
        snapshot: String,
    },
    /// Rank markets for one commodity by modal price
    Rank {
        #[arg(short, long, default_value = "snapshot.csv")]
        snapshot: String,

        #[arg(short, long)]
        commodity: String,

        /// Also rank within this state
        #[arg(long)]
        state: Option<String>,

        /// Number of markets to keep
        #[arg(short = 'n', long, default_value_t = COMPARE_TOP_N)]
        top: usize,

        /// Cheapest first instead of dearest first
        #[arg(long, default_value_t = false)]
        ascending: bool,

        /// Optional: CSV file to append ranked entries to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Highest and lowest top-5 markets, nationally and within a state
    Compare {
        #[arg(short, long, default_value = "snapshot.csv")]
        snapshot: String,

        #[arg(short, long)]
        commodity: String,

        #[arg(long)]
        state: Option<String>,
    },
    /// Monthly historical series aligned for charting
    History {
        /// Live-feed commodity name
        #[arg(short, long)]
        commodity: String,

        #[arg(long)]
        state: Option<String>,

        /// Archive CSV (falls back to MANDI_ARCHIVE_PATH)
        #[arg(long)]
        archive: Option<String>,

        /// Commodity name map JSON (falls back to MANDI_NAME_MAP_PATH)
        #[arg(long)]
        name_map: Option<String>,

        /// Retry without the state when it has no data
        #[arg(long, default_value_t = false)]
        fallback_national: bool,
    },
    /// Revenue after transport, with alternate-market projections
    Transport {
        #[arg(short, long)]
        quantity: f64,

        /// Unit price at the chosen market
        #[arg(short, long)]
        price: f64,

        #[arg(long)]
        flat_cost: Option<f64>,

        #[arg(long)]
        distance: Option<f64>,

        /// Cost per unit of distance
        #[arg(long)]
        rate: Option<f64>,

        /// Optional: snapshot to project alternate markets from
        #[arg(short, long)]
        snapshot: Option<String>,

        #[arg(short, long)]
        commodity: Option<String>,

        #[arg(long)]
        state: Option<String>,
    },
}

#[derive(Serialize)]
struct IndexReport<'a> {
    states: Vec<&'a str>,
    commodities: Vec<&'a str>,
    #[serde(flatten)]
    index: &'a CommodityIndex,
}

#[derive(Serialize)]
struct Failure {
    reason: &'static str,
    message: String,
}

impl From<&AlignError> for Failure {
    fn from(e: &AlignError) -> Self {
        Failure {
            reason: e.reason(),
            message: e.to_string(),
        }
    }
}

#[derive(Serialize)]
struct TransportReport {
    result: TransportResult,
    alternatives: Vec<MarketProjection>,
}

#[derive(Serialize)]
struct HistoryReport {
    view: Option<HistoricalView>,
    failure: Option<Failure>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/mandi_prices.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("mandi_prices.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index { snapshot } => {
            let rows = fetch_snapshot(&CsvSnapshotSource::new(&snapshot), None);
            let index = build_index(&rows);

            info!(
                rows = rows.len(),
                commodities = index.commodity_to_states.len(),
                states = index.state_to_commodities.len(),
                "Index built"
            );

            print_json(&IndexReport {
                states: index.states(),
                commodities: index.commodities(),
                index: &index,
            })?;
        }
        Commands::Rank {
            snapshot,
            commodity,
            state,
            top,
            ascending,
            output,
        } => {
            let rows = fetch_snapshot(&CsvSnapshotSource::new(&snapshot), Some(commodity.as_str()));
            let order = if ascending {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            };

            let mut subsets = vec![top_n(&rows, &commodity, top, order, Scope::National)];
            if let Some(state) = state {
                subsets.push(top_n(&rows, &commodity, top, order, Scope::State(state)));
            }

            if subsets.iter().all(|s| s.is_empty()) {
                warn!(commodity = %commodity, "No prices for this selection");
            }

            if let Some(path) = output {
                for subset in &subsets {
                    append_records(&path, &subset.records())?;
                }
                info!(path = %path, "Ranked entries appended");
            }

            print_json(&subsets)?;
        }
        Commands::Compare {
            snapshot,
            commodity,
            state,
        } => {
            let rows = fetch_snapshot(&CsvSnapshotSource::new(&snapshot), Some(commodity.as_str()));
            let comparison = compare_markets(&rows, &commodity, state.as_deref());
            print_pretty(&comparison);
            print_json(&comparison)?;
        }
        Commands::History {
            commodity,
            state,
            archive,
            name_map,
            fallback_national,
        } => {
            let archive_path = archive
                .or_else(|| std::env::var("MANDI_ARCHIVE_PATH").ok())
                .unwrap_or_else(|| DEFAULT_ARCHIVE_PATH.to_string());
            let name_map_path = name_map
                .or_else(|| std::env::var("MANDI_NAME_MAP_PATH").ok())
                .unwrap_or_else(|| DEFAULT_NAME_MAP_PATH.to_string());

            let archive = HistoricalArchive::load(&archive_path)?;
            let name_map = CommodityNameMap::load(&name_map_path)?;
            info!(entries = name_map.len(), "Commodity name map loaded");

            let result = match state.as_deref() {
                Some(state) => align(&archive, &commodity, state, &name_map),
                None => align_national(&archive, &commodity, &name_map),
            };

            let report = match result {
                Ok(view) => HistoryReport {
                    view: Some(view),
                    failure: None,
                },
                Err(e @ AlignError::NoStateData { .. }) if fallback_national => {
                    warn!(error = %e, "Falling back to the national series");
                    HistoryReport {
                        view: align_national(&archive, &commodity, &name_map).ok(),
                        failure: Some(Failure::from(&e)),
                    }
                }
                Err(e) => {
                    warn!(reason = e.reason(), error = %e, "Historical view unavailable");
                    HistoryReport {
                        view: None,
                        failure: Some(Failure::from(&e)),
                    }
                }
            };

            print_json(&report)?;
        }
        Commands::Transport {
            quantity,
            price,
            flat_cost,
            distance,
            rate,
            snapshot,
            commodity,
            state,
        } => {
            if distance.is_some() != rate.is_some() {
                bail!("--distance and --rate must be given together");
            }

            let cost = TransportCost::from_inputs(flat_cost, distance, rate);
            let result = calculate(quantity, price, cost);

            let alternatives = match (snapshot, commodity) {
                (Some(snapshot), Some(commodity)) => {
                    let rows = fetch_snapshot(&CsvSnapshotSource::new(&snapshot), Some(commodity.as_str()));
                    let comparison = compare_markets(&rows, &commodity, state.as_deref());

                    let mut subsets = vec![&comparison.national_highest];
                    if let Some(ref s) = comparison.state_highest {
                        subsets.push(s);
                    }
                    project_alternatives(quantity, cost, &result, &subsets)
                }
                _ => Vec::new(),
            };

            print_json(&TransportReport {
                result,
                alternatives,
            })?;
        }
    }

    Ok(())
}
