use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{GoldType, Money, SnapshotRecord, TransactionRecord, TransactionType};

/// Physical gold held, in chỉ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldHoldings {
    pub branded: Decimal,
    pub private: Decimal,
}

/// Sum gold quantities by type: BUY/DEPOSIT add, SELL/WITHDRAW subtract.
pub fn gold_holdings(transactions: &[TransactionRecord]) -> GoldHoldings {
    let mut holdings = GoldHoldings::default();
    for tx in transactions {
        let (Some(gold_type), Some(qty)) = (tx.gold_type, tx.quantity_chi) else {
            continue;
        };
        let signed = match tx.transaction_type {
            TransactionType::Buy | TransactionType::Deposit => qty,
            TransactionType::Sell | TransactionType::Withdraw => -qty,
            _ => continue,
        };
        match gold_type {
            GoldType::Branded => holdings.branded += signed,
            GoldType::Private => holdings.private += signed,
        }
    }
    holdings
}

pub fn gold_nav(holdings: &GoldHoldings, branded_price: Money, private_price: Money) -> Money {
    holdings.branded * branded_price + holdings.private * private_price
}

/// NAV implied by the snapshot's gold prices, if it carries any.
pub fn gold_nav_from_snapshot(transactions: &[TransactionRecord], snapshot: &SnapshotRecord) -> Option<Money> {
    if !snapshot.has_gold_prices() {
        return None;
    }
    let holdings = gold_holdings(transactions);
    Some(gold_nav(
        &holdings,
        snapshot.branded_gold_price.unwrap_or(Decimal::ZERO),
        snapshot.private_gold_price.unwrap_or(Decimal::ZERO),
    ))
}
