//! Cash-flow normalization.
//!
//! Converts ledger transactions into the investor-perspective flow series
//! the XIRR solver expects: capital committed by the investor is negative,
//! capital returned to the investor is positive. The ledger's own sign is
//! ignored except for TRANSFER, where it encodes the direction.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::FlowScope;
use crate::types::{CashFlow, Money, TransactionRecord, TransactionType};

/// Direction of a TRANSFER relative to the account that recorded it.
fn is_incoming_transfer(tx: &TransactionRecord) -> bool {
    tx.transaction_type == TransactionType::Transfer && tx.amount > Decimal::ZERO
}

fn is_outgoing_transfer(tx: &TransactionRecord) -> bool {
    tx.transaction_type == TransactionType::Transfer && tx.amount < Decimal::ZERO
}

/// Whether a transaction contributes a flow under `scope`.
pub fn in_scope(transaction_type: TransactionType, scope: FlowScope) -> bool {
    match scope {
        FlowScope::AllFlows => true,
        FlowScope::External => matches!(
            transaction_type,
            TransactionType::Deposit
                | TransactionType::Withdraw
                | TransactionType::Transfer
                | TransactionType::Fee
        ),
    }
}

/// Investor-perspective signed amount for one transaction, fee included.
pub fn signed_flow(tx: &TransactionRecord) -> Money {
    let amount = tx.amount.abs();
    let signed = match tx.transaction_type {
        TransactionType::Deposit | TransactionType::Buy | TransactionType::Fee => -amount,
        TransactionType::Withdraw | TransactionType::Sell | TransactionType::Dividend => amount,
        TransactionType::Transfer => {
            if is_incoming_transfer(tx) {
                -amount
            } else {
                amount
            }
        }
    };
    let fee = tx.fee.map(|f| f.abs()).unwrap_or(Decimal::ZERO);
    signed - fee
}

/// Normalize transactions into a date-ascending cash-flow series.
///
/// Same-day transactions stay separate entries. Flows that net to zero are
/// dropped. The sort is stable, so same-day entries keep ledger order.
pub fn normalize_cash_flows(transactions: &[TransactionRecord], scope: FlowScope) -> Vec<CashFlow> {
    let mut flows: Vec<CashFlow> = Vec::with_capacity(transactions.len());
    for tx in transactions {
        if !in_scope(tx.transaction_type, scope) {
            continue;
        }
        let amount = signed_flow(tx);
        if amount.is_zero() {
            debug!(date = %tx.date, kind = ?tx.transaction_type, "Dropping zero-amount flow");
            continue;
        }
        flows.push(CashFlow::new(tx.date, amount));
    }
    flows.sort_by_key(|f| f.date);
    flows
}

/// Gross capital put in: deposits plus incoming transfers.
pub fn total_invested(transactions: &[TransactionRecord]) -> Money {
    transactions
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Deposit || is_incoming_transfer(t))
        .map(|t| t.amount.abs())
        .sum()
}

/// Gross capital taken out: withdrawals plus outgoing transfers.
pub fn total_withdrawn(transactions: &[TransactionRecord]) -> Money {
    transactions
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Withdraw || is_outgoing_transfer(t))
        .map(|t| t.amount.abs())
        .sum()
}

/// Balance of a cash account from its ledger.
pub fn cash_balance(transactions: &[TransactionRecord]) -> Money {
    total_invested(transactions) - total_withdrawn(transactions)
}
