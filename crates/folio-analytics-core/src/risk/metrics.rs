use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{AnalyticsConfig, RiskConfig};
use crate::nav::NavSeries;
use crate::types::*;
use crate::AnalyticsResult;

use super::monthly::{compile_monthly_returns, MonthlyReturn};

/// Risk statistics for one NAV series. All values are percentages except
/// the Sharpe ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub sharpe_ratio: Decimal,
    /// Annualized population standard deviation of monthly returns
    pub standard_deviation: Percent,
    /// Largest peak-to-trough decline, as a positive number
    pub max_drawdown: Percent,
    pub win_rate: Percent,
    pub best_month: Percent,
    pub worst_month: Percent,
}

/// Input for the risk report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskInput {
    pub snapshots: NavSeries,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub metrics: RiskMetrics,
    pub monthly_returns: Vec<MonthlyReturn>,
}

/// Maximum drawdown over the raw (not resampled) series, in percent.
pub fn max_drawdown(series: &NavSeries) -> Percent {
    let mut points = series.iter();
    let Some(first) = points.next() else {
        return Decimal::ZERO;
    };
    let mut peak = first.nav;
    let mut max_dd = Decimal::ZERO;
    for p in points {
        if p.nav > peak {
            peak = p.nav;
        }
        if peak > Decimal::ZERO {
            let dd = (peak - p.nav) / peak * dec!(100);
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Share of strictly positive returns, in percent. Zero is not a win.
pub fn win_rate(returns: &[Percent]) -> Percent {
    if returns.is_empty() {
        return Decimal::ZERO;
    }
    let wins = returns.iter().filter(|r| **r > Decimal::ZERO).count();
    Decimal::from(wins as i64) / Decimal::from(returns.len() as i64) * dec!(100)
}

/// Risk metrics for a NAV series. Fewer than 2 points gives all zeros.
pub fn compute_risk_metrics(series: &NavSeries, config: &RiskConfig) -> RiskMetrics {
    if series.len() < 2 {
        return RiskMetrics::default();
    }
    let returns: Vec<Percent> = compile_monthly_returns(series).iter().map(|r| r.value).collect();
    metrics_from_returns(series, &returns, config)
}

fn metrics_from_returns(series: &NavSeries, returns: &[Percent], config: &RiskConfig) -> RiskMetrics {
    let max_drawdown = max_drawdown(series);
    if returns.is_empty() {
        return RiskMetrics {
            max_drawdown,
            ..RiskMetrics::default()
        };
    }

    let n = Decimal::from(returns.len() as i64);
    let periods = Decimal::from(config.periods_per_year);
    let mean: Decimal = returns.iter().sum::<Decimal>() / n;
    let variance: Decimal = returns.iter().map(|r| (r - mean) * (r - mean)).sum::<Decimal>() / n;
    let volatility = sqrt_decimal(variance) * sqrt_decimal(periods);

    let sharpe_ratio = if volatility.is_zero() {
        Decimal::ZERO
    } else {
        (mean * periods - config.risk_free_rate) / volatility
    };

    RiskMetrics {
        sharpe_ratio,
        standard_deviation: volatility,
        max_drawdown,
        win_rate: win_rate(returns),
        best_month: returns.iter().copied().max().unwrap_or(Decimal::ZERO),
        worst_month: returns.iter().copied().min().unwrap_or(Decimal::ZERO),
    }
}

/// Risk metrics plus the monthly returns they were computed from.
pub fn calculate_risk_metrics(
    input: &RiskInput,
    config: &AnalyticsConfig,
) -> AnalyticsResult<ComputationOutput<RiskReport>> {
    let start = Instant::now();
    config.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let series = &input.snapshots;
    let monthly_returns = if series.len() < 2 {
        warnings.push(format!(
            "{} NAV point(s) supplied; at least 2 are needed, metrics default to 0",
            series.len()
        ));
        Vec::new()
    } else {
        compile_monthly_returns(series)
    };

    for r in monthly_returns.iter().filter(|r| r.span_months > 1) {
        warnings.push(format!(
            "Return for {}-{:02} spans {} months since the previous snapshot",
            r.year,
            r.month + 1,
            r.span_months
        ));
    }

    let metrics = if series.len() < 2 {
        RiskMetrics::default()
    } else {
        let values: Vec<Percent> = monthly_returns.iter().map(|r| r.value).collect();
        metrics_from_returns(series, &values, &config.risk)
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Risk metrics from last-observation-per-month returns; population std-dev annualized by sqrt(periods)",
        &serde_json::json!({
            "periods_per_year": config.risk.periods_per_year,
            "risk_free_rate": config.risk.risk_free_rate.to_string(),
            "nav_points": series.len(),
        }),
        warnings,
        elapsed,
        RiskReport {
            metrics,
            monthly_returns,
        },
    ))
}

fn sqrt_decimal(val: Decimal) -> Decimal {
    if val <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    val.sqrt().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NavPoint;
    use chrono::NaiveDate;

    fn monthly(navs: &[Decimal]) -> NavSeries {
        NavSeries::new(navs.iter().enumerate().map(|(i, nav)| {
            let date = NaiveDate::from_ymd_opt(2023 + (i / 12) as i32, (i % 12) as u32 + 1, 28).unwrap();
            NavPoint::new(date, *nav)
        }))
        .unwrap()
    }

    #[test]
    fn test_max_drawdown() {
        let series = monthly(&[dec!(100), dec!(120), dec!(90), dec!(95), dec!(130)]);
        assert_eq!(max_drawdown(&series), dec!(25));
    }

    #[test]
    fn test_rising_series_has_no_drawdown() {
        let series = monthly(&[dec!(100), dec!(101), dec!(150)]);
        assert_eq!(max_drawdown(&series), Decimal::ZERO);
    }

    #[test]
    fn test_win_rate_ignores_zero() {
        assert_eq!(win_rate(&[dec!(5), dec!(-2), dec!(3), dec!(0)]), dec!(50));
        assert_eq!(win_rate(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_fewer_than_two_points_all_zero() {
        let series = monthly(&[dec!(100)]);
        assert_eq!(compute_risk_metrics(&series, &RiskConfig::default()), RiskMetrics::default());
    }

    #[test]
    fn test_constant_returns_zero_volatility() {
        // +10% every month: no dispersion, so Sharpe is defined as 0
        let series = monthly(&[dec!(100), dec!(110), dec!(121), dec!(133.1)]);
        let m = compute_risk_metrics(&series, &RiskConfig::default());
        assert_eq!(m.standard_deviation, Decimal::ZERO);
        assert_eq!(m.sharpe_ratio, Decimal::ZERO);
        assert_eq!(m.win_rate, dec!(100));
        assert_eq!(m.best_month, dec!(10));
        assert_eq!(m.worst_month, dec!(10));
    }

    #[test]
    fn test_volatility_and_sharpe() {
        // Returns +10% then -10%: mean 0, population std 10, annualized 10*sqrt(12)
        let series = monthly(&[dec!(100), dec!(110), dec!(99)]);
        let m = compute_risk_metrics(&series, &RiskConfig::default());
        let expected = dec!(34.641016);
        assert!(
            (m.standard_deviation - expected).abs() < dec!(0.0001),
            "Expected ~{}, got {}",
            expected,
            m.standard_deviation
        );
        assert!(m.sharpe_ratio.abs() < dec!(0.0000001), "got {}", m.sharpe_ratio);
        assert_eq!(m.best_month, dec!(10));
        assert_eq!(m.worst_month, dec!(-10));
        assert_eq!(m.win_rate, dec!(50));
    }

    #[test]
    fn test_report_warns_on_gaps() {
        let series = NavSeries::new(vec![
            NavPoint::new(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), dec!(100)),
            NavPoint::new(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(), dec!(105)),
        ])
        .unwrap();
        let out = calculate_risk_metrics(&RiskInput { snapshots: series }, &AnalyticsConfig::default()).unwrap();
        assert_eq!(out.result.monthly_returns.len(), 1);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("2024-04"));
    }
}
