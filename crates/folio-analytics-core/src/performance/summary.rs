use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::config::AnalyticsConfig;
use crate::nav::NavSeries;
use crate::time_value::xirr_with_terminal_value;
use crate::types::*;
use crate::AnalyticsResult;

use super::cash_flow::{normalize_cash_flows, total_invested, total_withdrawn};
use super::gold::gold_nav_from_snapshot;

/// Input for a single portfolio's performance summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<AssetType>,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
    #[serde(default)]
    pub snapshots: Vec<SnapshotRecord>,
    /// "Today" for the liquidation flow in XIRR
    pub valuation_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_invested: Money,
    pub total_withdrawn: Money,
    pub current_nav: Money,
    /// current_nav + total_withdrawn
    pub total_equity: Money,
    /// total_equity - total_invested
    pub profit: Money,
    pub profit_percentage: Percent,
    /// None when XIRR is not computable
    pub xirr: Option<Percent>,
}

/// Latest snapshot by date; on a date tie the later record wins.
fn latest_snapshot(snapshots: &[SnapshotRecord]) -> Option<&SnapshotRecord> {
    snapshots
        .iter()
        .enumerate()
        .max_by_key(|(idx, s)| (s.date, *idx))
        .map(|(_, s)| s)
}

/// Compute the summary and any warnings, without the output envelope.
pub fn compute_summary(
    input: &PerformanceInput,
    config: &AnalyticsConfig,
) -> AnalyticsResult<(PerformanceSummary, Vec<String>)> {
    let mut warnings: Vec<String> = Vec::new();

    // Validates NAVs before anything numerical runs
    let series = NavSeries::from_snapshots(&input.snapshots)?;

    let latest = latest_snapshot(&input.snapshots);
    let current_nav = match (input.asset_type, latest) {
        (Some(AssetType::Gold), Some(snap)) => match gold_nav_from_snapshot(&input.transactions, snap) {
            Some(nav) => nav,
            None => {
                warn!(date = %snap.date, "Gold portfolio snapshot has no gold prices; using snapshot NAV");
                warnings.push(format!(
                    "Snapshot on {} has no gold prices; NAV taken from the snapshot",
                    snap.date
                ));
                snap.nav
            }
        },
        (_, Some(_)) => series.latest().map(|p| p.nav).unwrap_or(Decimal::ZERO),
        (_, None) => {
            warnings.push("No snapshots available; current NAV is 0".into());
            Decimal::ZERO
        }
    };

    let invested = total_invested(&input.transactions);
    let withdrawn = total_withdrawn(&input.transactions);
    let total_equity = current_nav + withdrawn;
    let profit = total_equity - invested;
    let profit_percentage = if invested > Decimal::ZERO {
        profit / invested * dec!(100)
    } else {
        Decimal::ZERO
    };

    let flows = normalize_cash_flows(&input.transactions, config.flow_scope);
    let xirr = xirr_with_terminal_value(&flows, current_nav, input.valuation_date, &config.xirr);
    if xirr.is_none() {
        warnings.push("XIRR not computable for these cash flows".into());
    }

    Ok((
        PerformanceSummary {
            total_invested: invested,
            total_withdrawn: withdrawn,
            current_nav,
            total_equity,
            profit,
            profit_percentage,
            xirr,
        },
        warnings,
    ))
}

/// Summarize a portfolio: invested, withdrawn, NAV, equity, profit and XIRR.
pub fn summarize_performance(
    input: &PerformanceInput,
    config: &AnalyticsConfig,
) -> AnalyticsResult<ComputationOutput<PerformanceSummary>> {
    let start = Instant::now();
    config.validate()?;

    let (summary, warnings) = compute_summary(input, config)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Performance summary: equity = NAV + withdrawn, money-weighted XIRR (actual/365)",
        &serde_json::json!({
            "valuation_date": input.valuation_date.to_string(),
            "flow_scope": config.flow_scope,
            "transactions": input.transactions.len(),
            "snapshots": input.snapshots.len(),
        }),
        warnings,
        elapsed,
        summary,
    ))
}
