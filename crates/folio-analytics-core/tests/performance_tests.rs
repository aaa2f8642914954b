use chrono::NaiveDate;
use folio_analytics_core::config::{AnalyticsConfig, FlowScope};
use folio_analytics_core::performance::cash_flow::{cash_balance, normalize_cash_flows};
use folio_analytics_core::performance::chart::build_performance_chart;
use folio_analytics_core::performance::holdings::{calculate_holdings, HoldingsInput};
use folio_analytics_core::performance::summary::{summarize_performance, PerformanceInput};
use folio_analytics_core::time_range::TimeRange;
use folio_analytics_core::{AssetType, CashFlow, SnapshotRecord, TransactionRecord, TransactionType};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn stock_ledger() -> Vec<TransactionRecord> {
    vec![
        TransactionRecord::new(d(2023, 1, 1), TransactionType::Deposit, dec!(100000000)),
        TransactionRecord::new(d(2023, 1, 3), TransactionType::Buy, dec!(60000000)).with_fee(dec!(90000)),
        TransactionRecord::new(d(2023, 6, 1), TransactionType::Deposit, dec!(50000000)),
        TransactionRecord::new(d(2023, 9, 1), TransactionType::Sell, dec!(30000000)).with_fee(dec!(45000)),
        TransactionRecord::new(d(2023, 12, 1), TransactionType::Withdraw, dec!(20000000)),
    ]
}

fn stock_snapshots() -> Vec<SnapshotRecord> {
    vec![
        SnapshotRecord::new(d(2023, 3, 31), dec!(102000000)),
        SnapshotRecord::new(d(2023, 6, 30), dec!(155000000)),
        SnapshotRecord::new(d(2023, 12, 31), dec!(145000000)),
    ]
}

// ---------------------------------------------------------------------------
// Cash-flow normalizer
// ---------------------------------------------------------------------------

#[test]
fn test_external_scope_flows() {
    let flows = normalize_cash_flows(&stock_ledger(), FlowScope::External);
    assert_eq!(
        flows,
        vec![
            CashFlow::new(d(2023, 1, 1), dec!(-100000000)),
            CashFlow::new(d(2023, 6, 1), dec!(-50000000)),
            CashFlow::new(d(2023, 12, 1), dec!(20000000)),
        ]
    );
}

#[test]
fn test_all_flows_scope_includes_trades_net_of_fees() {
    let flows = normalize_cash_flows(&stock_ledger(), FlowScope::AllFlows);
    assert_eq!(flows.len(), 5);
    assert_eq!(flows[1].amount, dec!(-60090000));
    assert_eq!(flows[3].amount, dec!(29955000));
}

#[test]
fn test_unsorted_ledger_is_sorted() {
    let mut ledger = stock_ledger();
    ledger.reverse();
    let flows = normalize_cash_flows(&ledger, FlowScope::External);
    assert!(flows.windows(2).all(|w| w[0].date <= w[1].date));
}

#[test]
fn test_cash_account_balance() {
    let ledger = vec![
        TransactionRecord::new(d(2024, 1, 1), TransactionType::Deposit, dec!(5000000)),
        TransactionRecord::new(d(2024, 1, 10), TransactionType::Transfer, dec!(-2000000)),
        TransactionRecord::new(d(2024, 2, 1), TransactionType::Withdraw, dec!(500000)),
    ];
    assert_eq!(cash_balance(&ledger), dec!(2500000));
}

// ---------------------------------------------------------------------------
// Performance summary
// ---------------------------------------------------------------------------

#[test]
fn test_stock_portfolio_summary() {
    let input = PerformanceInput {
        asset_type: Some(AssetType::Stock),
        transactions: stock_ledger(),
        snapshots: stock_snapshots(),
        valuation_date: d(2024, 1, 1),
    };
    let out = summarize_performance(&input, &AnalyticsConfig::default()).unwrap();
    let s = out.result;
    assert_eq!(s.total_invested, dec!(150000000));
    assert_eq!(s.total_withdrawn, dec!(20000000));
    assert_eq!(s.current_nav, dec!(145000000));
    assert_eq!(s.total_equity, dec!(165000000));
    assert_eq!(s.profit, dec!(15000000));
    assert_eq!(s.profit_percentage, dec!(10));
    let xirr = s.xirr.unwrap();
    assert!(xirr > dec!(10) && xirr < dec!(15), "Expected XIRR between 10% and 15%, got {}", xirr);
    assert!(out.warnings.is_empty());
}

#[test]
fn test_summary_serializes_missing_xirr_as_null() {
    let input = PerformanceInput {
        asset_type: None,
        transactions: vec![],
        snapshots: vec![SnapshotRecord::new(d(2024, 1, 1), dec!(1000))],
        valuation_date: d(2024, 1, 1),
    };
    let out = summarize_performance(&input, &AnalyticsConfig::default()).unwrap();
    let json = serde_json::to_value(&out.result).unwrap();
    assert!(json["xirr"].is_null());
}

#[test]
fn test_summary_from_json_request() {
    let json = r#"{
        "asset_type": "FOREX",
        "valuation_date": "2024-01-01",
        "transactions": [
            {"date": "2023-01-01", "type": "DEPOSIT", "amount": "1000000"}
        ],
        "snapshots": [
            {"date": "2023-12-31", "nav": "1100000"}
        ]
    }"#;
    let input: PerformanceInput = serde_json::from_str(json).unwrap();
    let s = summarize_performance(&input, &AnalyticsConfig::default()).unwrap().result;
    assert_eq!(s.profit, dec!(100000));
    let xirr = s.xirr.unwrap();
    assert!((xirr - dec!(10)).abs() < dec!(0.01), "Expected ~10%, got {}", xirr);
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

#[test]
fn test_chart_equity_matches_summary_at_end() {
    let ledger = stock_ledger();
    let snaps = stock_snapshots();
    let chart = build_performance_chart(&ledger, &snaps, TimeRange::All, d(2024, 1, 1)).unwrap();
    let last = chart.data.last().unwrap();
    assert_eq!(last.date, d(2023, 12, 31));
    assert_eq!(last.total_invested, dec!(150000000));
    assert_eq!(last.total_withdrawn, dec!(20000000));
    assert_eq!(last.total_equity, dec!(165000000));
    // 5 transaction dates + 3 snapshot dates, none shared
    assert_eq!(chart.data.len(), 8);
    assert_eq!(chart.data[0].current_nav, Decimal::ZERO);
}

#[test]
fn test_chart_six_month_window() {
    let chart =
        build_performance_chart(&stock_ledger(), &stock_snapshots(), TimeRange::SixMonths, d(2024, 1, 1)).unwrap();
    assert!(chart.has_data);
    assert!(chart.data.iter().all(|p| p.date >= d(2023, 7, 1)));
    assert_eq!(chart.data[0].date, d(2023, 9, 1));
    assert_eq!(chart.data[0].current_nav, dec!(155000000));
}

// ---------------------------------------------------------------------------
// Stock holdings
// ---------------------------------------------------------------------------

#[test]
fn test_holdings_from_json_request() {
    let json = r#"{
        "transactions": [
            {"date": "2024-01-02", "type": "DEPOSIT", "amount": "50000000"},
            {"date": "2024-01-03", "type": "BUY", "amount": "-20030000", "fee": "30000", "ticker": "fpt", "quantity": "200"},
            {"date": "2024-02-10", "type": "SELL", "amount": "11000000", "ticker": "FPT", "quantity": "100"},
            {"date": "2024-02-11", "type": "BUY", "amount": "-9000000", "ticker": "HPG", "quantity": "300"}
        ],
        "prices": {"FPT": "120000", "hpg": "28000"}
    }"#;
    let input: HoldingsInput = serde_json::from_str(json).unwrap();
    let out = calculate_holdings(&input).unwrap();
    assert!(out.warnings.is_empty());

    let tickers: Vec<&str> = out.result.holdings.iter().map(|h| h.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["FPT", "HPG"]);
    let fpt = &out.result.holdings[0];
    assert_eq!(fpt.quantity, dec!(100));
    assert_eq!(fpt.total_cost, dec!(10015000));
    assert_eq!(fpt.market_value, dec!(12000000));
    assert_eq!(out.result.total_market_value, dec!(20400000));
    assert_eq!(out.result.total_cost, dec!(19015000));
    assert_eq!(out.result.total_profit, dec!(1385000));
}
