use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use folio_analytics_core::performance::chart::{self, ChartInput};
use folio_analytics_core::performance::holdings::{self, HoldingsInput};
use folio_analytics_core::performance::summary::{self, PerformanceInput};
use folio_analytics_core::time_range::TimeRange;
use folio_analytics_core::AnalyticsConfig;

use crate::input;

/// Arguments for a portfolio performance summary
#[derive(Args)]
pub struct PerformanceArgs {
    /// Path to JSON/YAML input file: {asset_type?, transactions, snapshots, valuation_date?}
    #[arg(long)]
    pub input: Option<String>,

    /// Valuation date for the terminal NAV flow (defaults to today)
    #[arg(long)]
    pub valuation_date: Option<NaiveDate>,
}

/// Arguments for the equity-curve chart series
#[derive(Args)]
pub struct ChartArgs {
    /// Path to JSON/YAML input file: {transactions, snapshots, range?, as_of?}
    #[arg(long)]
    pub input: Option<String>,

    /// Time range: 1M, 3M, 6M, YTD, 1Y, ALL
    #[arg(long)]
    pub range: Option<TimeRange>,

    /// Reference date for the range (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for the open stock positions breakdown
#[derive(Args)]
pub struct HoldingsArgs {
    /// Path to JSON/YAML input file: {transactions, prices?}
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_performance(args: PerformanceArgs, config: &AnalyticsConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = input::require_request(args.input.as_deref(), "performance")?;
    input::set_date(&mut request, "valuation_date", args.valuation_date);
    let perf_input: PerformanceInput = input::parse(request)?;

    let result = summary::summarize_performance(&perf_input, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_chart(args: ChartArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = input::require_request(args.input.as_deref(), "chart")?;
    input::set_date(&mut request, "as_of", args.as_of);
    input::set_flag(&mut request, "range", args.range.map(|r| r.label().to_string()));
    let chart_input: ChartInput = input::parse(request)?;

    let result = chart::performance_chart(&chart_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_holdings(args: HoldingsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = input::require_request(args.input.as_deref(), "holdings")?;
    let holdings_input: HoldingsInput = input::parse(request)?;

    let result = holdings::calculate_holdings(&holdings_input)?;
    Ok(serde_json::to_value(result)?)
}
