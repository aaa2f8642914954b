use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::debug;

use crate::types::{with_metadata, ComputationOutput, Money, Percent, TransactionRecord, TransactionType};
use crate::AnalyticsResult;

/// Residual share counts below this are treated as a closed position.
const QUANTITY_EPSILON: Decimal = dec!(0.000001);

/// Input for the stock holdings breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingsInput {
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
    /// Latest price per ticker; tickers missing here are valued at average cost
    #[serde(default)]
    pub prices: HashMap<String, Money>,
}

/// One open stock position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockHolding {
    pub ticker: String,
    pub quantity: Decimal,
    pub total_cost: Money,
    pub avg_cost: Money,
    pub current_price: Money,
    pub market_value: Money,
    pub profit: Money,
    pub profit_percentage: Percent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockHoldings {
    pub holdings: Vec<StockHolding>,
    pub total_market_value: Money,
    pub total_cost: Money,
    pub total_profit: Money,
    pub total_profit_percentage: Percent,
}

#[derive(Default)]
struct Position {
    quantity: Decimal,
    cost: Money,
}

fn profit_percentage(profit: Money, cost: Money) -> Percent {
    if cost > Decimal::ZERO {
        profit / cost * dec!(100)
    } else {
        Decimal::ZERO
    }
}

/// Open positions by ticker, on the average-cost method.
///
/// BUY adds its quantity and the absolute cash amount (fees included) to the
/// cost basis. SELL first releases cost at the current average, then reduces
/// the quantity. Transactions without a ticker are ignored and tickers are
/// matched case-insensitively. A zero or missing price falls back to the
/// average cost.
pub fn stock_holdings(transactions: &[TransactionRecord], prices: &HashMap<String, Money>) -> StockHoldings {
    let mut txs: Vec<&TransactionRecord> = transactions.iter().collect();
    txs.sort_by_key(|t| t.date);

    let mut positions: BTreeMap<String, Position> = BTreeMap::new();
    for tx in txs {
        let Some(ticker) = tx.ticker.as_deref() else {
            continue;
        };
        let position = positions.entry(ticker.to_uppercase()).or_default();
        let qty = tx.quantity.unwrap_or(Decimal::ZERO);

        match tx.transaction_type {
            TransactionType::Buy => {
                position.quantity += qty;
                position.cost += tx.amount.abs();
            }
            TransactionType::Sell => {
                if position.quantity > Decimal::ZERO {
                    position.cost -= qty * position.cost / position.quantity;
                }
                position.quantity -= qty;
            }
            _ => {}
        }

        if position.quantity.abs() < QUANTITY_EPSILON {
            position.quantity = Decimal::ZERO;
            position.cost = Decimal::ZERO;
        }
    }

    let prices: HashMap<String, Money> = prices.iter().map(|(k, v)| (k.to_uppercase(), *v)).collect();

    let mut holdings = Vec::new();
    let mut total_market_value = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    for (ticker, position) in positions {
        if position.quantity <= Decimal::ZERO {
            continue;
        }
        let avg_cost = position.cost / position.quantity;
        let current_price = match prices.get(&ticker) {
            Some(price) if !price.is_zero() => *price,
            _ => avg_cost,
        };
        let market_value = position.quantity * current_price;
        let profit = market_value - position.cost;

        total_market_value += market_value;
        total_cost += position.cost;
        holdings.push(StockHolding {
            ticker,
            quantity: position.quantity,
            total_cost: position.cost,
            avg_cost,
            current_price,
            market_value,
            profit,
            profit_percentage: profit_percentage(profit, position.cost),
        });
    }

    let total_profit = total_market_value - total_cost;
    StockHoldings {
        holdings,
        total_market_value,
        total_cost,
        total_profit,
        total_profit_percentage: profit_percentage(total_profit, total_cost),
    }
}

/// Enveloped holdings breakdown; warns for positions valued without a price.
pub fn calculate_holdings(input: &HoldingsInput) -> AnalyticsResult<ComputationOutput<StockHoldings>> {
    let start = Instant::now();
    let result = stock_holdings(&input.transactions, &input.prices);

    let priced: Vec<String> = input
        .prices
        .iter()
        .filter(|(_, price)| !price.is_zero())
        .map(|(ticker, _)| ticker.to_uppercase())
        .collect();
    let warnings: Vec<String> = result
        .holdings
        .iter()
        .filter(|h| !priced.contains(&h.ticker))
        .map(|h| format!("No price for {}; valued at average cost", h.ticker))
        .collect();
    debug!(positions = result.holdings.len(), unpriced = warnings.len(), "Stock holdings computed");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Stock holdings: average-cost basis, fees included in cost, market value at latest price",
        &serde_json::json!({
            "transactions": input.transactions.len(),
            "priced_tickers": input.prices.len(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn buy(date: NaiveDate, ticker: &str, qty: Decimal, amount: Money) -> TransactionRecord {
        TransactionRecord::new(date, TransactionType::Buy, -amount).with_stock(ticker, qty)
    }

    fn sell(date: NaiveDate, ticker: &str, qty: Decimal, amount: Money) -> TransactionRecord {
        TransactionRecord::new(date, TransactionType::Sell, amount).with_stock(ticker, qty)
    }

    #[test]
    fn test_average_cost_after_partial_sell() {
        let txs = vec![
            buy(d(2024, 1, 2), "fpt", dec!(100), dec!(10000000)),
            buy(d(2024, 2, 1), "FPT", dec!(100), dec!(12000000)),
            sell(d(2024, 3, 1), "FPT", dec!(50), dec!(7000000)),
        ];
        let prices = HashMap::from([("FPT".to_string(), dec!(130000))]);
        let out = stock_holdings(&txs, &prices);

        assert_eq!(out.holdings.len(), 1);
        let h = &out.holdings[0];
        assert_eq!(h.ticker, "FPT");
        assert_eq!(h.quantity, dec!(150));
        assert_eq!(h.total_cost, dec!(16500000));
        assert_eq!(h.avg_cost, dec!(110000));
        assert_eq!(h.market_value, dec!(19500000));
        assert_eq!(h.profit, dec!(3000000));
        assert_eq!(out.total_profit, dec!(3000000));
    }

    #[test]
    fn test_sell_recorded_before_buy_in_input_order() {
        // Processed by date, not by position in the list
        let txs = vec![
            sell(d(2024, 3, 1), "VNM", dec!(10), dec!(700000)),
            buy(d(2024, 1, 2), "VNM", dec!(10), dec!(600000)),
        ];
        let out = stock_holdings(&txs, &HashMap::new());
        assert!(out.holdings.is_empty());
        assert_eq!(out.total_cost, Decimal::ZERO);
    }

    #[test]
    fn test_closed_and_tickerless_are_dropped() {
        let txs = vec![
            buy(d(2024, 1, 2), "HPG", dec!(100), dec!(2500000)),
            sell(d(2024, 2, 1), "HPG", dec!(100), dec!(2800000)),
            buy(d(2024, 2, 2), "MWG", dec!(10), dec!(500000)),
            TransactionRecord::new(d(2024, 2, 3), TransactionType::Buy, dec!(-100000)),
            TransactionRecord::new(d(2024, 2, 4), TransactionType::Deposit, dec!(1000000)),
        ];
        let out = stock_holdings(&txs, &HashMap::new());
        let tickers: Vec<&str> = out.holdings.iter().map(|h| h.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["MWG"]);
    }

    #[test]
    fn test_missing_price_falls_back_to_avg_cost() {
        let txs = vec![buy(d(2024, 1, 2), "ACB", dec!(200), dec!(5000000))];
        let prices = HashMap::from([("acb".to_string(), Decimal::ZERO)]);
        let out = stock_holdings(&txs, &prices);
        let h = &out.holdings[0];
        assert_eq!(h.current_price, dec!(25000));
        assert_eq!(h.market_value, dec!(5000000));
        assert_eq!(h.profit_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_envelope_warns_for_unpriced_tickers() {
        let input = HoldingsInput {
            transactions: vec![
                buy(d(2024, 1, 2), "FPT", dec!(10), dec!(1000000)),
                buy(d(2024, 1, 3), "VCB", dec!(10), dec!(900000)),
            ],
            prices: HashMap::from([("fpt".to_string(), dec!(120000))]),
        };
        let out = calculate_holdings(&input).unwrap();
        assert_eq!(out.warnings, vec!["No price for VCB; valued at average cost".to_string()]);
        assert_eq!(out.result.total_market_value, dec!(2100000));
        assert_eq!(out.result.total_cost, dec!(1900000));
    }
}
