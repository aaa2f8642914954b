use clap::Args;
use serde_json::Value;

use folio_analytics_core::dashboard::aggregate::{self, AssetFilter, DashboardInput};

use crate::input;

/// Arguments for the net-worth dashboard
#[derive(Args)]
pub struct DashboardArgs {
    /// Path to JSON/YAML input file: {portfolios: [{portfolio_id, name, asset_type, summary}], cash_accounts, filter?}
    #[arg(long)]
    pub input: Option<String>,

    /// Asset filter for the rollup: ALL, STOCK, FOREX, GOLD, CASH
    #[arg(long)]
    pub filter: Option<AssetFilter>,
}

pub fn run_dashboard(args: DashboardArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = input::require_request(args.input.as_deref(), "dashboard")?;
    input::set_flag(&mut request, "filter", args.filter.map(|f| f.to_string()));
    let dashboard_input: DashboardInput = input::parse(request)?;

    let result = aggregate::aggregate_dashboard(&dashboard_input)?;
    Ok(serde_json::to_value(result)?)
}
