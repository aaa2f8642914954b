//! Tunables for the analytics engine.
//!
//! Every field has a default, so an empty JSON object (or no config at all)
//! reproduces the standard behaviour.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::types::{Percent, Rate};
use crate::AnalyticsResult;

/// Which transactions count as capital crossing the investor's pocket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowScope {
    /// DEPOSIT, WITHDRAW, TRANSFER and FEE only; BUY/SELL/DIVIDEND are
    /// reallocations inside the portfolio.
    #[default]
    External,
    /// Every transaction type contributes a flow.
    AllFlows,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct XirrConfig {
    pub initial_guess: Rate,
    /// Absolute NPV tolerance, in currency units
    pub npv_tolerance: Decimal,
    /// Newton step size below which the rate is considered settled
    pub rate_tolerance: Decimal,
    pub max_iterations: u32,
    /// Days per year in the actual/N day count
    pub day_count_basis: Decimal,
    pub lower_bound: Rate,
    pub upper_bound: Rate,
}

impl Default for XirrConfig {
    fn default() -> Self {
        Self {
            initial_guess: dec!(0.1),
            npv_tolerance: dec!(0.000001),
            rate_tolerance: dec!(0.0000000001),
            max_iterations: 100,
            day_count_basis: dec!(365),
            lower_bound: dec!(-0.99),
            upper_bound: dec!(10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub periods_per_year: u32,
    /// Annual risk-free rate in percent, subtracted in the Sharpe numerator
    pub risk_free_rate: Percent,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            periods_per_year: 12,
            risk_free_rate: Decimal::ZERO,
        }
    }
}

pub const DEFAULT_PALETTE: [&str; 7] = [
    "#3b82f6", "#10b981", "#8b5cf6", "#f59e0b", "#ef4444", "#ec4899", "#06b6d4",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub max_series: usize,
    pub palette: Vec<String>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            max_series: 5,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ComparisonConfig {
    /// Colour for the series at `index` in the selection.
    pub fn color_for(&self, index: usize) -> String {
        if self.palette.is_empty() {
            return DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()].to_string();
        }
        self.palette[index % self.palette.len()].clone()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub xirr: XirrConfig,
    pub risk: RiskConfig,
    pub comparison: ComparisonConfig,
    pub flow_scope: FlowScope,
}

impl AnalyticsConfig {
    pub fn validate(&self) -> AnalyticsResult<()> {
        let x = &self.xirr;
        if x.npv_tolerance <= Decimal::ZERO {
            return Err(AnalyticsError::invalid("xirr.npv_tolerance", "must be positive"));
        }
        if x.rate_tolerance <= Decimal::ZERO {
            return Err(AnalyticsError::invalid("xirr.rate_tolerance", "must be positive"));
        }
        if x.max_iterations == 0 {
            return Err(AnalyticsError::invalid("xirr.max_iterations", "must be > 0"));
        }
        if x.day_count_basis <= Decimal::ZERO {
            return Err(AnalyticsError::invalid("xirr.day_count_basis", "must be positive"));
        }
        if x.lower_bound <= dec!(-1) {
            return Err(AnalyticsError::invalid(
                "xirr.lower_bound",
                "must be greater than -100%",
            ));
        }
        if x.lower_bound >= x.upper_bound {
            return Err(AnalyticsError::invalid(
                "xirr.upper_bound",
                "must be greater than lower_bound",
            ));
        }
        if x.initial_guess <= x.lower_bound || x.initial_guess >= x.upper_bound {
            return Err(AnalyticsError::invalid(
                "xirr.initial_guess",
                "must lie strictly inside [lower_bound, upper_bound]",
            ));
        }
        if self.risk.periods_per_year == 0 {
            return Err(AnalyticsError::invalid("risk.periods_per_year", "must be > 0"));
        }
        if self.comparison.max_series == 0 {
            return Err(AnalyticsError::invalid("comparison.max_series", "must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AnalyticsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: AnalyticsConfig =
            serde_json::from_str(r#"{"xirr":{"max_iterations":50},"flow_scope":"all_flows"}"#)
                .unwrap();
        assert_eq!(cfg.xirr.max_iterations, 50);
        assert_eq!(cfg.xirr.initial_guess, dec!(0.1));
        assert_eq!(cfg.risk.periods_per_year, 12);
        assert_eq!(cfg.flow_scope, FlowScope::AllFlows);
        assert_eq!(cfg.comparison.max_series, 5);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut cfg = AnalyticsConfig::default();
        cfg.xirr.lower_bound = dec!(2);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_palette_wraps() {
        let cfg = ComparisonConfig::default();
        assert_eq!(cfg.color_for(0), "#3b82f6");
        assert_eq!(cfg.color_for(7), "#3b82f6");
        assert_eq!(cfg.color_for(8), "#10b981");
    }
}
