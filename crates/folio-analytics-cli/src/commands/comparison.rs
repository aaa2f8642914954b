use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use folio_analytics_core::comparison::matrix::{self, ComparisonRequest};
use folio_analytics_core::time_range::TimeRange;
use folio_analytics_core::AnalyticsConfig;

use crate::input;

/// Arguments for a multi-portfolio comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON/YAML input file: {portfolios: [{id, name, snapshots}], range?, as_of?}
    #[arg(long)]
    pub input: Option<String>,

    /// Time range: 1M, 3M, 6M, YTD, 1Y, ALL
    #[arg(long)]
    pub range: Option<TimeRange>,

    /// Reference date for the range (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_compare(args: CompareArgs, config: &AnalyticsConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = input::require_request(args.input.as_deref(), "compare")?;
    input::set_date(&mut request, "as_of", args.as_of);
    input::set_flag(&mut request, "range", args.range.map(|r| r.label().to_string()));
    let comparison: ComparisonRequest = input::parse(request)?;

    let result = matrix::compare_portfolios(&comparison.portfolios, comparison.range, comparison.as_of, config)?;
    Ok(serde_json::to_value(result)?)
}
