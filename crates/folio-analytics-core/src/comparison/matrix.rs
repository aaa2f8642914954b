//! Multi-portfolio comparison.
//!
//! Each selected portfolio is rebased to its own first in-range snapshot so
//! series of very different size share one percentage axis. The chart axis is
//! the union of all in-range dates; a series with no snapshot on a date has a
//! hole there (`None`), never an interpolated value.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Instant;
use tracing::warn;

use crate::config::AnalyticsConfig;
use crate::error::AnalyticsError;
use crate::nav::NavSeries;
use crate::risk::metrics::{compute_risk_metrics, RiskMetrics};
use crate::time_range::TimeRange;
use crate::types::*;
use crate::AnalyticsResult;

/// One portfolio selected for comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub id: String,
    pub name: String,
    pub snapshots: NavSeries,
}

/// A full comparison request: selection, window and reference date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub portfolios: Vec<ComparisonInput>,
    #[serde(default)]
    pub range: TimeRange,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSeries {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// One x-axis position: rebased value per portfolio id, `None` for a hole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub date: NaiveDate,
    pub values: BTreeMap<String, Option<Percent>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonMetricsRow {
    pub id: String,
    pub name: String,
    pub color: String,
    /// First to last in-range snapshot, in percent
    pub total_return: Percent,
    pub metrics: RiskMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutput {
    pub range: TimeRange,
    pub start_date: NaiveDate,
    pub series: Vec<ComparisonSeries>,
    pub chart: Vec<ComparisonRow>,
    pub matrix: Vec<ComparisonMetricsRow>,
}

/// Percent change from `base` to `value`; `None` when the base is not positive.
pub fn rebase(value: Decimal, base: Decimal) -> Option<Percent> {
    if base > Decimal::ZERO {
        Some((value - base) / base * dec!(100))
    } else {
        None
    }
}

/// Total return from the first to the last point of an in-range series.
pub fn total_return(series: &NavSeries) -> Percent {
    match (series.first(), series.latest()) {
        (Some(first), Some(last)) => rebase(last.nav, first.nav).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Compare portfolios over `range` ending at `as_of`.
pub fn compare_portfolios(
    inputs: &[ComparisonInput],
    range: TimeRange,
    as_of: NaiveDate,
    config: &AnalyticsConfig,
) -> AnalyticsResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    config.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let max_series = config.comparison.max_series;
    if inputs.len() > max_series {
        return Err(AnalyticsError::TooManySeries {
            selected: inputs.len(),
            max: max_series,
        });
    }
    let mut seen = HashSet::new();
    for input in inputs {
        if !seen.insert(input.id.as_str()) {
            return Err(AnalyticsError::InvalidInput {
                field: "portfolios".into(),
                reason: format!("Portfolio '{}' selected more than once", input.id),
            });
        }
    }
    if inputs.len() < 2 {
        warnings.push("Select at least 2 portfolios for a meaningful comparison".into());
    }

    let start_date = range.start_date(as_of);
    let mut series = Vec::with_capacity(inputs.len());
    let mut matrix = Vec::with_capacity(inputs.len());
    // Per-portfolio in-range slice and its baseline, computed once
    let mut in_range: Vec<(&str, NavSeries, Decimal)> = Vec::with_capacity(inputs.len());

    for (idx, input) in inputs.iter().enumerate() {
        let color = config.comparison.color_for(idx);
        series.push(ComparisonSeries {
            id: input.id.clone(),
            name: input.name.clone(),
            color: color.clone(),
        });

        let window = input.snapshots.window(start_date, as_of);
        let Some(baseline) = window.first().map(|p| p.nav) else {
            warn!(portfolio = %input.id, range = %range, "No snapshots in range; series skipped");
            warnings.push(format!(
                "'{}' has no snapshots in range {}",
                input.name, range
            ));
            continue;
        };
        if baseline.is_zero() {
            warnings.push(format!(
                "'{}' starts the range at NAV 0; it cannot be rebased",
                input.name
            ));
        }

        matrix.push(ComparisonMetricsRow {
            id: input.id.clone(),
            name: input.name.clone(),
            color,
            total_return: total_return(&window),
            metrics: compute_risk_metrics(&window, &config.risk),
        });
        in_range.push((input.id.as_str(), window, baseline));
    }

    let dates: BTreeSet<NaiveDate> = in_range
        .iter()
        .flat_map(|(_, window, _)| window.iter().map(|p| p.date))
        .collect();

    let mut rows: BTreeMap<NaiveDate, BTreeMap<String, Option<Percent>>> = dates
        .into_iter()
        .map(|date| {
            let empty: BTreeMap<String, Option<Percent>> =
                inputs.iter().map(|i| (i.id.clone(), None)).collect();
            (date, empty)
        })
        .collect();
    for (id, window, baseline) in &in_range {
        for p in window.iter() {
            if let Some(values) = rows.get_mut(&p.date) {
                values.insert((*id).to_string(), rebase(p.nav, *baseline));
            }
        }
    }
    let chart = rows
        .into_iter()
        .map(|(date, values)| ComparisonRow { date, values })
        .collect();

    let output = ComparisonOutput {
        range,
        start_date,
        series,
        chart,
        matrix,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rebased comparison: each series relative to its first in-range snapshot, date-unioned axis without interpolation",
        &serde_json::json!({
            "range": range,
            "as_of": as_of.to_string(),
            "start_date": start_date.to_string(),
            "max_series": max_series,
        }),
        warnings,
        elapsed,
        output,
    ))
}
