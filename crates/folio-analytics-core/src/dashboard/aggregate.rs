use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

use crate::error::AnalyticsError;
use crate::performance::summary::PerformanceSummary;
use crate::types::*;
use crate::AnalyticsResult;

/// A portfolio's computed summary plus the metadata needed to group it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPerformanceEntry {
    pub portfolio_id: String,
    pub name: String,
    pub asset_type: AssetType,
    pub summary: PerformanceSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashBalance {
    pub cash_account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub balance: Money,
}

/// Asset-type filter for the rollup. Serialized as "ALL" or an asset type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AssetFilter {
    #[default]
    All,
    Only(AssetType),
}

impl AssetFilter {
    pub fn matches(&self, asset_type: AssetType) -> bool {
        match self {
            AssetFilter::All => true,
            AssetFilter::Only(t) => *t == asset_type,
        }
    }

    /// Cash accounts count towards the rollup under ALL and CASH.
    pub fn includes_cash(&self) -> bool {
        self.matches(AssetType::Cash)
    }
}

impl std::fmt::Display for AssetFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetFilter::All => f.write_str("ALL"),
            AssetFilter::Only(t) => write!(f, "{t}"),
        }
    }
}

impl FromStr for AssetFilter {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(AssetFilter::All),
            "STOCK" => Ok(AssetFilter::Only(AssetType::Stock)),
            "FOREX" => Ok(AssetFilter::Only(AssetType::Forex)),
            "GOLD" => Ok(AssetFilter::Only(AssetType::Gold)),
            "CASH" => Ok(AssetFilter::Only(AssetType::Cash)),
            other => Err(AnalyticsError::InvalidInput {
                field: "filter".into(),
                reason: format!("Unknown asset filter '{other}'. Use: ALL, STOCK, FOREX, GOLD, CASH"),
            }),
        }
    }
}

impl TryFrom<String> for AssetFilter {
    type Error = AnalyticsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetFilter> for String {
    fn from(value: AssetFilter) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardInput {
    #[serde(default)]
    pub portfolios: Vec<PortfolioPerformanceEntry>,
    #[serde(default)]
    pub cash_accounts: Vec<CashBalance>,
    #[serde(default)]
    pub filter: AssetFilter,
}

/// Net-worth split across all holdings, independent of the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardTotals {
    pub total_net_worth: Money,
    pub total_cash: Money,
    pub total_investment_nav: Money,
    pub cash_percentage: Percent,
    pub investment_percentage: Percent,
}

/// Rollup over the portfolios selected by the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTypeMetrics {
    pub asset_type: AssetFilter,
    pub total_net_worth: Money,
    pub total_withdrawn: Money,
    pub total_invested: Money,
    pub total_profit_loss: Money,
    pub profit_loss_percentage: Percent,
    /// Mean of the computable XIRRs; portfolios without one are left out
    pub average_xirr: Option<Percent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub totals: DashboardTotals,
    pub asset_metrics: AssetTypeMetrics,
    pub portfolios: Vec<PortfolioPerformanceEntry>,
    pub cash_accounts: Vec<CashBalance>,
}

/// Mean of the `Some` values, or `None` if there are none.
pub fn average_xirr(values: &[Option<Percent>]) -> Option<Percent> {
    let known: Vec<Percent> = values.iter().flatten().copied().collect();
    if known.is_empty() {
        return None;
    }
    Some(known.iter().sum::<Decimal>() / Decimal::from(known.len() as i64))
}

fn share_of(part: Money, whole: Money) -> Percent {
    if whole > Decimal::ZERO {
        part / whole * dec!(100)
    } else {
        Decimal::ZERO
    }
}

pub fn dashboard_totals(
    portfolios: &[PortfolioPerformanceEntry],
    cash_accounts: &[CashBalance],
) -> DashboardTotals {
    let total_cash: Money = cash_accounts.iter().map(|c| c.balance).sum();
    let total_investment_nav: Money = portfolios.iter().map(|p| p.summary.current_nav).sum();
    let total_net_worth = total_cash + total_investment_nav;
    DashboardTotals {
        total_net_worth,
        total_cash,
        total_investment_nav,
        cash_percentage: share_of(total_cash, total_net_worth),
        investment_percentage: share_of(total_investment_nav, total_net_worth),
    }
}

pub fn asset_type_metrics(
    portfolios: &[PortfolioPerformanceEntry],
    cash_accounts: &[CashBalance],
    filter: AssetFilter,
) -> AssetTypeMetrics {
    let selected: Vec<&PortfolioPerformanceEntry> =
        portfolios.iter().filter(|p| filter.matches(p.asset_type)).collect();

    let cash: Money = if filter.includes_cash() {
        cash_accounts.iter().map(|c| c.balance).sum()
    } else {
        Decimal::ZERO
    };
    let equity: Money = selected.iter().map(|p| p.summary.total_equity).sum();
    let total_withdrawn: Money = selected.iter().map(|p| p.summary.total_withdrawn).sum();
    let total_invested: Money = selected.iter().map(|p| p.summary.total_invested).sum();
    let total_profit_loss: Money = selected.iter().map(|p| p.summary.profit).sum();
    let xirrs: Vec<Option<Percent>> = selected.iter().map(|p| p.summary.xirr).collect();

    AssetTypeMetrics {
        asset_type: filter,
        total_net_worth: equity + cash,
        total_withdrawn,
        total_invested,
        total_profit_loss,
        profit_loss_percentage: share_of(total_profit_loss, total_invested),
        average_xirr: average_xirr(&xirrs),
    }
}

/// Roll per-portfolio summaries and cash balances into dashboard figures.
pub fn aggregate_dashboard(input: &DashboardInput) -> AnalyticsResult<ComputationOutput<Dashboard>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if let Some(p) = input
        .portfolios
        .iter()
        .find(|p| p.summary.current_nav < Decimal::ZERO)
    {
        return Err(AnalyticsError::NegativeNav {
            context: format!("portfolio '{}'", p.portfolio_id),
            nav: p.summary.current_nav,
        });
    }

    let totals = dashboard_totals(&input.portfolios, &input.cash_accounts);
    let asset_metrics = asset_type_metrics(&input.portfolios, &input.cash_accounts, input.filter);

    let portfolios: Vec<PortfolioPerformanceEntry> = input
        .portfolios
        .iter()
        .filter(|p| input.filter.matches(p.asset_type))
        .cloned()
        .collect();
    let cash_accounts = if input.filter.includes_cash() {
        input.cash_accounts.clone()
    } else {
        Vec::new()
    };

    let missing = portfolios.iter().filter(|p| p.summary.xirr.is_none()).count();
    if missing > 0 {
        warnings.push(format!(
            "{missing} portfolio(s) have no computable XIRR and are excluded from the average"
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Dashboard rollup: net worth = cash + NAV; average XIRR over computable values only",
        &serde_json::json!({
            "filter": input.filter,
            "portfolios": input.portfolios.len(),
            "cash_accounts": input.cash_accounts.len(),
        }),
        warnings,
        elapsed,
        Dashboard {
            totals,
            asset_metrics,
            portfolios,
            cash_accounts,
        },
    ))
}
