//! Monthly Return Compiler.
//!
//! Resamples a NAV series to one observation per calendar month (the last
//! snapshot seen in that month) and derives month-over-month returns. A gap of
//! several months between kept observations is one return period, not
//! interpolated; `span_months` records how many calendar months it covers.

use chrono::Datelike;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::nav::{NavPoint, NavSeries};
use crate::types::Percent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReturn {
    pub year: i32,
    /// Zero-based month (0 = January)
    pub month: u32,
    pub value: Percent,
    /// Calendar months since the previous kept observation (1 when consecutive)
    pub span_months: u32,
}

fn month_index(p: &NavPoint) -> i64 {
    i64::from(p.date.year()) * 12 + i64::from(p.date.month0())
}

/// Last NAV point of each calendar month, in date order.
pub fn month_end_points(series: &NavSeries) -> Vec<NavPoint> {
    let mut kept: Vec<NavPoint> = Vec::new();
    for p in series.iter() {
        match kept.last_mut() {
            Some(last) if month_index(last) == month_index(p) => *last = *p,
            _ => kept.push(*p),
        }
    }
    kept
}

/// Month-over-month percentage returns of `series`.
///
/// The first kept month has no predecessor and yields no return. A zero
/// previous NAV yields a 0% return for that period.
pub fn compile_monthly_returns(series: &NavSeries) -> Vec<MonthlyReturn> {
    let kept = month_end_points(series);
    kept.windows(2)
        .map(|w| {
            let (prev, curr) = (&w[0], &w[1]);
            let value = if prev.nav > Decimal::ZERO {
                (curr.nav - prev.nav) / prev.nav * dec!(100)
            } else {
                Decimal::ZERO
            };
            MonthlyReturn {
                year: curr.date.year(),
                month: curr.date.month0(),
                value,
                span_months: (month_index(curr) - month_index(prev)).max(1) as u32,
            }
        })
        .collect()
}
