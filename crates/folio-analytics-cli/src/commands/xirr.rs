use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use folio_analytics_core::time_value::{self, XirrInput};
use folio_analytics_core::{AnalyticsConfig, AnalyticsError, CashFlow};

use crate::input;

/// Arguments for a standalone XIRR calculation
#[derive(Args)]
pub struct XirrArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Dated flows, investor perspective (e.g. "2023-01-01:-1000000,2023-12-31:50000")
    #[arg(long, allow_hyphen_values = true)]
    pub flows: Option<String>,

    /// Current value, treated as a final inflow on the valuation date
    #[arg(long)]
    pub terminal_value: Option<Decimal>,

    /// Valuation date for the terminal value (defaults to today)
    #[arg(long)]
    pub valuation_date: Option<NaiveDate>,
}

/// Parse "YYYY-MM-DD:amount" pairs separated by commas.
pub fn parse_flows(raw: &str) -> Result<Vec<CashFlow>, AnalyticsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (date, amount) = pair
                .split_once(':')
                .ok_or_else(|| AnalyticsError::DateError(format!("Expected DATE:AMOUNT, got '{pair}'")))?;
            let date: NaiveDate = date
                .trim()
                .parse()
                .map_err(|e| AnalyticsError::DateError(format!("Bad date '{date}': {e}")))?;
            let amount: Decimal = amount.trim().parse().map_err(|_| AnalyticsError::InvalidInput {
                field: "flows".into(),
                reason: format!("Bad amount '{amount}'"),
            })?;
            Ok(CashFlow::new(date, amount))
        })
        .collect()
}

pub fn run_xirr(args: XirrArgs, config: &AnalyticsConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let xirr_input: XirrInput = if let Some(request) = input::read_request(args.input.as_deref())? {
        input::parse(request)?
    } else {
        let raw = args.flows.ok_or("--flows is required (or provide --input)")?;
        XirrInput {
            flows: parse_flows(&raw)?,
            terminal_value: args.terminal_value,
            valuation_date: Some(args.valuation_date.unwrap_or_else(input::today)),
        }
    };

    let result = time_value::calculate_xirr(&xirr_input, config)?;
    Ok(serde_json::to_value(result)?)
}
