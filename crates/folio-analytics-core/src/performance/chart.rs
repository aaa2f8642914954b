use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;

use crate::nav::NavSeries;
use crate::time_range::TimeRange;
use crate::types::{with_metadata, ComputationOutput, Money, SnapshotRecord, TransactionRecord, TransactionType};
use crate::AnalyticsResult;

/// Input for the equity-curve chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartInput {
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
    #[serde(default)]
    pub snapshots: Vec<SnapshotRecord>,
    #[serde(default)]
    pub range: TimeRange,
    pub as_of: NaiveDate,
}

/// One point of the equity curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub date: NaiveDate,
    pub total_invested: Money,
    pub total_withdrawn: Money,
    pub current_nav: Money,
    pub total_equity: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceChart {
    pub data: Vec<ChartDataPoint>,
    pub has_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PerformanceChart {
    fn empty(message: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            has_data: false,
            message: Some(message.into()),
        }
    }
}

/// Contribution of one transaction to (invested, withdrawn).
fn capital_movement(tx: &TransactionRecord) -> (Money, Money) {
    let amount = tx.amount.abs();
    match tx.transaction_type {
        TransactionType::Deposit => (amount, Decimal::ZERO),
        TransactionType::Withdraw => (Decimal::ZERO, amount),
        TransactionType::Transfer if tx.amount > Decimal::ZERO => (amount, Decimal::ZERO),
        TransactionType::Transfer => (Decimal::ZERO, amount),
        _ => (Decimal::ZERO, Decimal::ZERO),
    }
}

/// Build the invested / withdrawn / NAV / equity series for one portfolio.
///
/// The x-axis is the union of transaction and snapshot dates. NAV is carried
/// forward from the most recent snapshot, and is 0 before the first one.
/// Running totals are accumulated over the whole history before the range
/// filter, so the first in-range point still reflects earlier capital. Dates
/// after `as_of` are left out.
pub fn build_performance_chart(
    transactions: &[TransactionRecord],
    snapshots: &[SnapshotRecord],
    range: TimeRange,
    as_of: NaiveDate,
) -> AnalyticsResult<PerformanceChart> {
    let series = NavSeries::from_snapshots(snapshots)?;
    if series.is_empty() {
        return Ok(PerformanceChart::empty(
            "No snapshots available. Add a NAV snapshot to see the performance chart.",
        ));
    }

    let mut txs: Vec<&TransactionRecord> = transactions.iter().collect();
    txs.sort_by_key(|t| t.date);

    let dates: BTreeSet<NaiveDate> = txs
        .iter()
        .map(|t| t.date)
        .chain(series.iter().map(|p| p.date))
        .collect();

    let start = range.start_date(as_of);
    let points = series.points();
    let mut tx_idx = 0;
    let mut nav_idx = 0;
    let mut invested = Decimal::ZERO;
    let mut withdrawn = Decimal::ZERO;
    let mut current_nav = Decimal::ZERO;
    let mut data = Vec::new();

    for date in dates {
        while tx_idx < txs.len() && txs[tx_idx].date <= date {
            let (i, w) = capital_movement(txs[tx_idx]);
            invested += i;
            withdrawn += w;
            tx_idx += 1;
        }
        while nav_idx < points.len() && points[nav_idx].date <= date {
            current_nav = points[nav_idx].nav;
            nav_idx += 1;
        }
        if date > as_of {
            break;
        }
        if date < start {
            continue;
        }
        data.push(ChartDataPoint {
            date,
            total_invested: invested,
            total_withdrawn: withdrawn,
            current_nav,
            total_equity: current_nav + withdrawn,
        });
    }

    if data.is_empty() {
        return Ok(PerformanceChart::empty(format!(
            "No data in the selected range ({range})"
        )));
    }

    Ok(PerformanceChart {
        data,
        has_data: true,
        message: None,
    })
}

/// [`build_performance_chart`] wrapped in the standard output envelope.
pub fn performance_chart(input: &ChartInput) -> AnalyticsResult<ComputationOutput<PerformanceChart>> {
    let start = Instant::now();
    let chart = build_performance_chart(&input.transactions, &input.snapshots, input.range, input.as_of)?;
    let warnings = match (&chart.message, chart.has_data) {
        (Some(msg), false) => vec![msg.clone()],
        _ => Vec::new(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Equity curve over the union of transaction and snapshot dates, NAV carried forward",
        &serde_json::json!({
            "range": input.range,
            "as_of": input.as_of.to_string(),
            "start_date": input.range.start_date(input.as_of).to_string(),
        }),
        warnings,
        elapsed,
        chart,
    ))
}
