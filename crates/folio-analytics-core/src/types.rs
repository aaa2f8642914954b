use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values, in the single base currency (VND). Never f64.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Percentages as presented to users (5.0 = 5%).
pub type Percent = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Asset class of a portfolio or account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Stock,
    Forex,
    Gold,
    Cash,
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssetType::Stock => "STOCK",
            AssetType::Forex => "FOREX",
            AssetType::Gold => "GOLD",
            AssetType::Cash => "CASH",
        };
        f.write_str(s)
    }
}

/// Ledger transaction types supplied by the data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    Buy,
    Sell,
    Transfer,
    Fee,
    Dividend,
}

/// Gold grade for physical gold holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoldType {
    /// SJC, PNJ, DOJI bars
    Branded,
    Private,
}

/// A raw transaction record as stored by the ledger.
///
/// `amount` keeps whatever sign the ledger used. Only TRANSFER gives that sign
/// a meaning: positive is money arriving in the account, negative is money
/// leaving it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold_type: Option<GoldType>,
    /// Quantity in chỉ (1 chỉ = 3.75g)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_chi: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionRecord {
    pub fn new(date: NaiveDate, transaction_type: TransactionType, amount: Money) -> Self {
        Self {
            date,
            transaction_type,
            amount,
            fee: None,
            ticker: None,
            quantity: None,
            gold_type: None,
            quantity_chi: None,
            unit_price: None,
            description: None,
        }
    }

    pub fn with_fee(mut self, fee: Money) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn with_stock(mut self, ticker: impl Into<String>, quantity: Decimal) -> Self {
        self.ticker = Some(ticker.into());
        self.quantity = Some(quantity);
        self
    }

    pub fn with_gold(mut self, gold_type: GoldType, quantity_chi: Decimal) -> Self {
        self.gold_type = Some(gold_type);
        self.quantity_chi = Some(quantity_chi);
        self
    }
}

/// A raw NAV snapshot record as stored by the data store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub date: NaiveDate,
    pub nav: Money,
    /// Price per chỉ for branded gold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branded_gold_price: Option<Money>,
    /// Price per chỉ for private gold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_gold_price: Option<Money>,
}

impl SnapshotRecord {
    pub fn new(date: NaiveDate, nav: Money) -> Self {
        Self {
            date,
            nav,
            branded_gold_price: None,
            private_gold_price: None,
        }
    }

    pub fn has_gold_prices(&self) -> bool {
        self.branded_gold_price.is_some() || self.private_gold_price.is_some()
    }
}

/// A single signed cash flow, investor perspective (committed capital < 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: Money,
}

impl CashFlow {
    pub fn new(date: NaiveDate, amount: Money) -> Self {
        Self { date, amount }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transaction_record_from_ledger_json() {
        let json = r#"{"date":"2024-03-01","type":"SELL","amount":"2500000","fee":"15000","ticker":"FPT"}"#;
        let tx: TransactionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Sell);
        assert_eq!(tx.amount, dec!(2500000));
        assert_eq!(tx.fee, Some(dec!(15000)));
        assert_eq!(tx.ticker.as_deref(), Some("FPT"));
        assert!(tx.gold_type.is_none());
    }

    #[test]
    fn test_malformed_date_rejected() {
        let json = r#"{"date":"2024-13-45","nav":"100"}"#;
        assert!(serde_json::from_str::<SnapshotRecord>(json).is_err());
    }

    #[test]
    fn test_asset_type_display_matches_serde() {
        let s = serde_json::to_string(&AssetType::Gold).unwrap();
        assert_eq!(s, format!("\"{}\"", AssetType::Gold));
    }
}
