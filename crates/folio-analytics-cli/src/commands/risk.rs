use clap::Args;
use serde_json::Value;

use folio_analytics_core::risk::metrics::{self, RiskInput};
use folio_analytics_core::risk::monthly;
use folio_analytics_core::AnalyticsConfig;

use crate::input;

/// Arguments shared by the NAV-series commands
#[derive(Args)]
pub struct NavSeriesArgs {
    /// Path to JSON/YAML input file: {snapshots: [{date, nav}, ...]}
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_monthly_returns(args: NavSeriesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = input::require_request(args.input.as_deref(), "monthly-returns")?;
    let risk_input: RiskInput = input::parse(request)?;

    let returns = monthly::compile_monthly_returns(&risk_input.snapshots);
    Ok(serde_json::to_value(returns)?)
}

pub fn run_risk(args: NavSeriesArgs, config: &AnalyticsConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let request = input::require_request(args.input.as_deref(), "risk")?;
    let risk_input: RiskInput = input::parse(request)?;

    let result = metrics::calculate_risk_metrics(&risk_input, config)?;
    Ok(serde_json::to_value(result)?)
}
