use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::{AnalyticsConfig, XirrConfig};
use crate::error::AnalyticsError;
use crate::types::{with_metadata, CashFlow, ComputationOutput, Money, Percent, Rate, Years};
use crate::AnalyticsResult;

/// How the solver reached its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    NewtonRaphson,
    Bisection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XirrSolution {
    pub rate: Rate,
    pub iterations: u32,
    pub method: SolverMethod,
}

/// Year fraction between two dates under actual/`basis`.
pub fn year_fraction(from: NaiveDate, to: NaiveDate, basis: Decimal) -> Years {
    Decimal::from((to - from).num_days()) / basis
}

/// Net present value of dated flows at `rate`, discounted to the first flow's date.
///
/// Returns `None` when a discount factor overflows or is undefined.
pub fn xnpv(rate: Rate, flows: &[CashFlow], basis: Decimal) -> Option<Money> {
    let base = flows.first()?.date;
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let mut total = Decimal::ZERO;
    for cf in flows {
        let t = year_fraction(base, cf.date, basis);
        let discount = one_plus_r.checked_powd(t)?;
        if discount.is_zero() {
            return None;
        }
        total = total.checked_add(cf.amount.checked_div(discount)?)?;
    }
    Some(total)
}

/// NPV and its first derivative with respect to the rate.
fn xnpv_with_derivative(rate: Rate, flows: &[CashFlow], basis: Decimal) -> Option<(Money, Decimal)> {
    let base = flows.first()?.date;
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    for cf in flows {
        let t = year_fraction(base, cf.date, basis);
        let discount = one_plus_r.checked_powd(t)?;
        if discount.is_zero() {
            return None;
        }
        let pv = cf.amount.checked_div(discount)?;
        npv_val = npv_val.checked_add(pv)?;
        dnpv = dnpv.checked_sub(t.checked_mul(pv)?.checked_div(one_plus_r)?)?;
    }
    Some((npv_val, dnpv))
}

/// Sort flows by date and check they describe a solvable XIRR problem.
fn prepare_flows(flows: &[CashFlow]) -> AnalyticsResult<Vec<CashFlow>> {
    let mut sorted: Vec<CashFlow> = flows.iter().copied().filter(|f| !f.amount.is_zero()).collect();
    if sorted.len() < 2 {
        return Err(AnalyticsError::InsufficientData(
            "XIRR requires at least 2 non-zero cash flows".into(),
        ));
    }
    sorted.sort_by_key(|f| f.date);

    let has_negative = sorted.iter().any(|f| f.amount < Decimal::ZERO);
    let has_positive = sorted.iter().any(|f| f.amount > Decimal::ZERO);
    if !(has_negative && has_positive) {
        return Err(AnalyticsError::InsufficientData(
            "XIRR requires at least one negative and one positive cash flow".into(),
        ));
    }

    let first = sorted[0].date;
    let last = sorted[sorted.len() - 1].date;
    if (last - first).num_days() < 1 {
        return Err(AnalyticsError::InsufficientData(
            "Cash flows span less than one day".into(),
        ));
    }
    Ok(sorted)
}

/// Extended IRR for irregular cash flow dates.
///
/// Newton-Raphson from `config.initial_guess`, falling back to bisection over
/// `[lower_bound, upper_bound]` when Newton stalls, diverges or overflows.
pub fn solve_xirr(flows: &[CashFlow], config: &XirrConfig) -> AnalyticsResult<XirrSolution> {
    let sorted = prepare_flows(flows)?;
    let basis = config.day_count_basis;

    match newton_xirr(&sorted, config) {
        Ok(solution) => Ok(solution),
        Err(e) => {
            debug!(error = %e, "XIRR Newton-Raphson failed, trying bisection");
            bisect_xirr(&sorted, config, basis)
        }
    }
}

fn newton_xirr(flows: &[CashFlow], config: &XirrConfig) -> AnalyticsResult<XirrSolution> {
    let basis = config.day_count_basis;
    let mut rate = config.initial_guess;
    let mut last_delta = Decimal::ZERO;

    for i in 0..config.max_iterations {
        let (npv_val, dnpv) = xnpv_with_derivative(rate, flows, basis).ok_or_else(|| {
            AnalyticsError::ConvergenceFailure {
                function: "XIRR".into(),
                iterations: i,
                last_delta,
            }
        })?;
        last_delta = npv_val;

        if npv_val.abs() < config.npv_tolerance {
            return Ok(XirrSolution {
                rate,
                iterations: i,
                method: SolverMethod::NewtonRaphson,
            });
        }

        if dnpv.is_zero() {
            return Err(AnalyticsError::ConvergenceFailure {
                function: "XIRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        let step = npv_val / dnpv;
        let mut next = rate - step;

        // Guard against divergence
        if next <= config.lower_bound {
            next = config.lower_bound;
        } else if next >= config.upper_bound {
            next = config.upper_bound;
        }

        // Pinned at a bound with NPV still away from zero
        if next == rate && (next == config.lower_bound || next == config.upper_bound) {
            return Err(AnalyticsError::ConvergenceFailure {
                function: "XIRR".into(),
                iterations: i + 1,
                last_delta: npv_val,
            });
        }

        if (next - rate).abs() < config.rate_tolerance {
            return Ok(XirrSolution {
                rate: next,
                iterations: i + 1,
                method: SolverMethod::NewtonRaphson,
            });
        }
        rate = next;
    }

    Err(AnalyticsError::ConvergenceFailure {
        function: "XIRR".into(),
        iterations: config.max_iterations,
        last_delta,
    })
}

/// Inward steps tried per bracket end before giving up.
const BRACKET_STEPS: u32 = 24;

/// First rate from `rate` toward 0 at which `xnpv` is defined.
///
/// Over long spans the configured bounds discount to values `Decimal` cannot
/// hold (0.01^t underflows, 11^t overflows). The lower end doubles `1 + r`
/// and the upper end halves it until the NPV is representable.
fn evaluable_end(rate: Rate, flows: &[CashFlow], basis: Decimal, from_below: bool) -> Option<(Rate, Money)> {
    let mut rate = rate;
    for _ in 0..BRACKET_STEPS {
        if let Some(value) = xnpv(rate, flows, basis) {
            return Some((rate, value));
        }
        let next = if from_below {
            rate * dec!(2) + Decimal::ONE
        } else {
            (rate - Decimal::ONE) / dec!(2)
        };
        if (from_below && next >= Decimal::ZERO) || (!from_below && next <= Decimal::ZERO) {
            return None;
        }
        rate = next;
    }
    None
}

fn bisect_xirr(flows: &[CashFlow], config: &XirrConfig, basis: Decimal) -> AnalyticsResult<XirrSolution> {
    let failure = |iterations: u32, last_delta: Decimal| AnalyticsError::ConvergenceFailure {
        function: "XIRR (bisection)".into(),
        iterations,
        last_delta,
    };

    let (mut lo, mut f_lo) =
        evaluable_end(config.lower_bound, flows, basis, true).ok_or_else(|| failure(0, Decimal::ZERO))?;
    let (mut hi, f_hi) =
        evaluable_end(config.upper_bound, flows, basis, false).ok_or_else(|| failure(0, Decimal::ZERO))?;
    if lo != config.lower_bound || hi != config.upper_bound {
        debug!(lo = %lo, hi = %hi, "XIRR bracket narrowed to representable rates");
    }

    if f_lo.is_sign_negative() == f_hi.is_sign_negative() {
        // No sign change inside the bracket
        return Err(failure(0, f_lo));
    }

    // Enough halvings to reach rate_tolerance from the default bracket
    let max_steps = config.max_iterations.max(200);
    let mut last_delta = f_lo;
    for i in 0..max_steps {
        let mid = (lo + hi) / dec!(2);
        let f_mid = xnpv(mid, flows, basis).ok_or_else(|| failure(i, last_delta))?;
        last_delta = f_mid;

        if f_mid.abs() < config.npv_tolerance || (hi - lo) / dec!(2) < config.rate_tolerance {
            return Ok(XirrSolution {
                rate: mid,
                iterations: i + 1,
                method: SolverMethod::Bisection,
            });
        }

        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(failure(max_steps, last_delta))
}

/// Annualized rate of return, or `None` when it is not computable.
///
/// "Not computable" covers single flows, one-signed flow sets, flows spanning
/// less than a day and non-convergence. None of these abort the caller.
pub fn xirr(flows: &[CashFlow], config: &XirrConfig) -> Option<Rate> {
    match solve_xirr(flows, config) {
        Ok(solution) => Some(solution.rate),
        Err(e) => {
            debug!(flows = flows.len(), error = %e, "XIRR not computable");
            None
        }
    }
}

/// XIRR of `flows` plus a terminal liquidation inflow of `terminal_value` at
/// `valuation_date`, as a percentage.
pub fn xirr_with_terminal_value(
    flows: &[CashFlow],
    terminal_value: Money,
    valuation_date: NaiveDate,
    config: &XirrConfig,
) -> Option<Percent> {
    let mut all = flows.to_vec();
    if terminal_value > Decimal::ZERO {
        all.push(CashFlow::new(valuation_date, terminal_value));
    }
    xirr(&all, config).map(|r| r * dec!(100))
}

/// Input for a standalone XIRR request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XirrInput {
    /// Investor-perspective flows (committed capital negative)
    pub flows: Vec<CashFlow>,
    /// Current value, appended as a final inflow when positive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_value: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XirrOutput {
    /// Annualized return in percent, `None` when not computable
    pub xirr: Option<Percent>,
    pub iterations: Option<u32>,
    pub method: Option<SolverMethod>,
    pub flow_count: usize,
}

/// XIRR with solver diagnostics, wrapped in the standard output envelope.
pub fn calculate_xirr(input: &XirrInput, config: &AnalyticsConfig) -> AnalyticsResult<ComputationOutput<XirrOutput>> {
    let start = Instant::now();
    config.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let mut flows = input.flows.clone();
    if let Some(terminal) = input.terminal_value.filter(|v| *v > Decimal::ZERO) {
        let date = input.valuation_date.ok_or_else(|| {
            AnalyticsError::invalid("valuation_date", "required when terminal_value is given")
        })?;
        flows.push(CashFlow::new(date, terminal));
    }

    let output = match solve_xirr(&flows, &config.xirr) {
        Ok(solution) => XirrOutput {
            xirr: Some(solution.rate * dec!(100)),
            iterations: Some(solution.iterations),
            method: Some(solution.method),
            flow_count: flows.len(),
        },
        Err(e) => {
            warnings.push(format!("XIRR not computable: {e}"));
            XirrOutput {
                xirr: None,
                iterations: None,
                method: None,
                flow_count: flows.len(),
            }
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "XIRR: Newton-Raphson with bisection fallback, actual/365 day count",
        &config.xirr,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_xnpv_zero_rate_is_sum() {
        let flows = vec![
            CashFlow::new(d(2024, 1, 1), dec!(-100)),
            CashFlow::new(d(2024, 6, 1), dec!(40)),
            CashFlow::new(d(2025, 1, 1), dec!(70)),
        ];
        assert_eq!(xnpv(Decimal::ZERO, &flows, dec!(365)), Some(dec!(10)));
    }

    #[test]
    fn test_xirr_textbook_ten_percent() {
        let flows = vec![
            CashFlow::new(d(2023, 1, 1), dec!(-1000000)),
            CashFlow::new(d(2024, 1, 1), dec!(1100000)),
        ];
        let r = xirr(&flows, &XirrConfig::default()).unwrap();
        assert!((r - dec!(0.10)).abs() < dec!(0.0001), "Expected ~10%, got {}", r);
    }

    #[test]
    fn test_xirr_one_signed_is_none() {
        let flows = vec![
            CashFlow::new(d(2023, 1, 1), dec!(-1000)),
            CashFlow::new(d(2024, 1, 1), dec!(-500)),
        ];
        assert!(xirr(&flows, &XirrConfig::default()).is_none());
    }

    #[test]
    fn test_xirr_single_flow_is_none() {
        let flows = vec![CashFlow::new(d(2023, 1, 1), dec!(-1000))];
        assert!(xirr(&flows, &XirrConfig::default()).is_none());
    }

    #[test]
    fn test_xirr_same_day_is_none() {
        let flows = vec![
            CashFlow::new(d(2023, 1, 1), dec!(-1000)),
            CashFlow::new(d(2023, 1, 1), dec!(1100)),
        ];
        assert!(matches!(
            solve_xirr(&flows, &XirrConfig::default()),
            Err(AnalyticsError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_bisection_recovers_from_bad_guess() {
        // Two Newton steps from 950% overshoot to the lower clamp and stop
        // there; bisection must still find the ~10% root.
        let flows = vec![
            CashFlow::new(d(2020, 1, 1), dec!(-1000)),
            CashFlow::new(d(2021, 1, 1), dec!(1100)),
        ];
        let config = XirrConfig {
            initial_guess: dec!(9.5),
            max_iterations: 2,
            ..XirrConfig::default()
        };
        let solution = solve_xirr(&flows, &config).unwrap();
        assert_eq!(solution.method, SolverMethod::Bisection);
        // 2020 is a leap year: 366 days under actual/365
        assert!((solution.rate - dec!(0.0997)).abs() < dec!(0.001), "got {}", solution.rate);
    }

    #[test]
    fn test_calculate_xirr_reports_failure_as_null() {
        let input = XirrInput {
            flows: vec![CashFlow::new(d(2023, 1, 1), dec!(-1000))],
            terminal_value: None,
            valuation_date: None,
        };
        let out = calculate_xirr(&input, &AnalyticsConfig::default()).unwrap();
        assert!(out.result.xirr.is_none());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_calculate_xirr_terminal_needs_date() {
        let input = XirrInput {
            flows: vec![CashFlow::new(d(2023, 1, 1), dec!(-1000))],
            terminal_value: Some(dec!(1100)),
            valuation_date: None,
        };
        assert!(calculate_xirr(&input, &AnalyticsConfig::default()).is_err());
    }

    #[test]
    fn test_terminal_value_appended() {
        let flows = vec![CashFlow::new(d(2023, 1, 1), dec!(-1000000))];
        let pct = xirr_with_terminal_value(&flows, dec!(1100000), d(2024, 1, 1), &XirrConfig::default())
            .unwrap();
        assert!((pct - dec!(10)).abs() < dec!(0.01), "Expected ~10%, got {}", pct);
    }
}
